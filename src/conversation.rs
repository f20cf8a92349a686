use std::collections::HashSet;

use uuid::Uuid;

use crate::entity::messages::Model as MessageModel;

const SEPARATOR: char = ':';

/// Thread id for two participants, independent of who wrote first.
pub fn make_conversation_id(a: Uuid, b: Uuid) -> String {
    let (a, b) = (a.to_string(), b.to_string());
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("{low}{SEPARATOR}{high}")
}

/// The other participant of `message` from `user_id`'s point of view.
pub fn peer_of(user_id: Uuid, message: &MessageModel) -> Uuid {
    if message.from_user_id == user_id {
        message.to_user_id
    } else {
        message.from_user_id
    }
}

/// Keep the first message seen per peer. With input ordered newest first
/// this yields each peer's latest message, peers ordered by recency.
pub fn latest_per_peer(user_id: Uuid, messages: Vec<MessageModel>) -> Vec<(Uuid, MessageModel)> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter_map(|message| {
            let peer = peer_of(user_id, &message);
            seen.insert(peer).then_some((peer, message))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn message(from: Uuid, to: Uuid, body: &str, age_secs: i64) -> MessageModel {
        MessageModel {
            id: Uuid::new_v4(),
            conversation_id: make_conversation_id(from, to),
            from_user_id: from,
            to_user_id: to,
            body: body.into(),
            created_at: (Utc::now() - Duration::seconds(age_secs)).fixed_offset(),
        }
    }

    #[test]
    fn conversation_id_is_symmetric() {
        for _ in 0..32 {
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
            assert_eq!(make_conversation_id(a, b), make_conversation_id(b, a));
        }
    }

    #[test]
    fn conversation_id_differs_for_distinct_pairs() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_ne!(make_conversation_id(a, b), make_conversation_id(a, c));
        assert_ne!(make_conversation_id(a, b), make_conversation_id(b, c));
    }

    #[test]
    fn conversation_id_sorts_lexicographically() {
        let low = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
        let high = Uuid::parse_str("ffffffff-0000-4000-8000-000000000001").unwrap();
        assert_eq!(
            make_conversation_id(high, low),
            format!("{low}:{high}")
        );
    }

    #[test]
    fn keeps_latest_message_per_peer() {
        let me = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let newest_first = vec![
            message(alice, me, "alice newest", 1),
            message(me, bob, "to bob newest", 2),
            message(me, alice, "to alice older", 3),
            message(bob, me, "bob oldest", 4),
        ];

        let reduced = latest_per_peer(me, newest_first);
        let summary: Vec<(Uuid, &str)> = reduced
            .iter()
            .map(|(peer, m)| (*peer, m.body.as_str()))
            .collect();
        assert_eq!(summary, vec![(alice, "alice newest"), (bob, "to bob newest")]);
    }
}
