use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    conversation::{latest_per_peer, make_conversation_id},
    dto::{
        bookings::BookingSnippet,
        messages::{ConversationList, ConversationSummary, MessageList, PeerProfile, SendMessageRequest},
    },
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        garages::{Column as GarageCol, Entity as Garages},
        messages::{ActiveModel as MessageActive, Column as MessageCol, Entity as Messages},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Message,
    response::{ApiResponse, Meta},
    routes::params::{MessageQuery, non_empty},
    state::AppState,
};

/// How far back the conversation list looks.
pub const CONVERSATION_SCAN_LIMIT: u64 = 500;

pub async fn send_message(
    state: &AppState,
    user: &AuthUser,
    payload: SendMessageRequest,
) -> AppResult<ApiResponse<Message>> {
    let to_user_id = payload
        .to_user_id
        .ok_or_else(|| AppError::BadRequest("to_user_id is required".into()))?;
    let body = non_empty(payload.body.as_deref())
        .ok_or_else(|| AppError::BadRequest("body is required".into()))?
        .to_string();
    if to_user_id == user.user_id {
        return Err(AppError::BadRequest("Cannot message yourself".into()));
    }

    Users::find_by_id(to_user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        conversation_id: Set(make_conversation_id(user.user_id, to_user_id)),
        from_user_id: Set(user.user_id),
        to_user_id: Set(to_user_id),
        body: Set(body),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(message_id = %message.id, conversation_id = %message.conversation_id, "message sent");

    Ok(ApiResponse::success(
        "Message sent",
        Message::from(message),
        Some(Meta::empty()),
    ))
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    query: MessageQuery,
) -> AppResult<ApiResponse<MessageList>> {
    let peer_id = query
        .peer_id
        .ok_or_else(|| AppError::BadRequest("peer_id is required".into()))?;

    let mut finder = Messages::find()
        .filter(MessageCol::ConversationId.eq(make_conversation_id(user.user_id, peer_id)));
    if let Some(since) = query.since.filter(|ms| *ms > 0) {
        // Stored timestamps carry microseconds; compare at millisecond precision.
        let next_ms = since
            .checked_add(1)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or_else(|| AppError::BadRequest("since is out of range".into()))?;
        finder = finder.filter(MessageCol::CreatedAt.gte(next_ms));
    }

    let messages: Vec<Message> = finder
        .order_by_asc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Message::from)
        .collect();

    let total = messages.len() as i64;
    Ok(ApiResponse::success(
        "Messages",
        MessageList { messages },
        Some(Meta::total(total)),
    ))
}

/// Latest booking per client at any of `owner_id`'s garages.
async fn latest_bookings_by_client(
    state: &AppState,
    owner_id: Uuid,
    clients: &[Uuid],
) -> AppResult<HashMap<Uuid, BookingSnippet>> {
    let garages: HashMap<Uuid, String> = Garages::find()
        .filter(GarageCol::OwnerId.eq(owner_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();
    if garages.is_empty() || clients.is_empty() {
        return Ok(HashMap::new());
    }

    let bookings = Bookings::find()
        .filter(BookingCol::GarageId.is_in(garages.keys().copied()))
        .filter(BookingCol::UserId.is_in(clients.iter().copied()))
        .order_by_desc(BookingCol::StartTime)
        .all(&state.orm)
        .await?;

    let mut latest = HashMap::new();
    for booking in bookings {
        let Some(client) = booking.user_id else {
            continue;
        };
        latest.entry(client).or_insert_with(|| {
            BookingSnippet::new(
                booking.id,
                garages.get(&booking.garage_id).cloned(),
                booking.start_time.with_timezone(&Utc),
            )
        });
    }
    Ok(latest)
}

pub async fn list_conversations(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ConversationList>> {
    let recent = Messages::find()
        .filter(
            Condition::any()
                .add(MessageCol::FromUserId.eq(user.user_id))
                .add(MessageCol::ToUserId.eq(user.user_id)),
        )
        .order_by_desc(MessageCol::CreatedAt)
        .limit(CONVERSATION_SCAN_LIMIT)
        .all(&state.orm)
        .await?;

    let threads = latest_per_peer(user.user_id, recent);
    let peer_ids: Vec<Uuid> = threads.iter().map(|(peer, _)| *peer).collect();

    let profiles: HashMap<Uuid, PeerProfile> = if peer_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(peer_ids.iter().copied()))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    PeerProfile {
                        id: u.id,
                        name: Some(u.name),
                        email: Some(u.email),
                    },
                )
            })
            .collect()
    };
    let mut bookings = latest_bookings_by_client(state, user.user_id, &peer_ids).await?;

    let items: Vec<ConversationSummary> = threads
        .into_iter()
        .map(|(peer_id, message)| ConversationSummary {
            peer: profiles.get(&peer_id).cloned().unwrap_or(PeerProfile {
                id: peer_id,
                name: None,
                email: None,
            }),
            latest_booking: bookings.remove(&peer_id),
            last_message: Message::from(message),
            peer_id,
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Conversations",
        ConversationList { items },
        Some(Meta::total(total)),
    ))
}
