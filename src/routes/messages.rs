use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::messages::{ConversationList, MessageList, SendMessageRequest},
    error::AppResult,
    extractors::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::Message,
    response::ApiResponse,
    routes::params::MessageQuery,
    services::message_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages).post(send_message))
        .route("/conversations", get(list_conversations))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<Message>),
        (status = 400, description = "Missing recipient or body"),
        (status = 404, description = "Recipient not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let resp = message_service::send_message(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "Messages with one peer, oldest first", body = ApiResponse<MessageList>),
        (status = 400, description = "Missing peer_id")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<MessageQuery>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = message_service::list_messages(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/messages/conversations",
    responses(
        (status = 200, description = "Latest message per peer, most recent first", body = ApiResponse<ConversationList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ConversationList>>> {
    let resp = message_service::list_conversations(&state, &user).await?;
    Ok(Json(resp))
}
