use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::bookings::BookingSnippet, models::Message};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub to_user_id: Option<Uuid>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageList {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeerProfile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationSummary {
    pub peer_id: Uuid,
    pub peer: PeerProfile,
    pub last_message: Message,
    pub latest_booking: Option<BookingSnippet>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationList {
    pub items: Vec<ConversationSummary>,
}
