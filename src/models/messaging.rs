// ABOUTME: Conversation and message models for direct messaging between farmers
// ABOUTME: Normalized participant pairs, the last-message cache pointer, and list summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::PublicProfile;

/// The unique relationship entity between two identities
///
/// The participant pair is stored normalized (`participant_low` orders before
/// `participant_high` as UUID text) so the storage layer can enforce
/// at-most-one conversation per unordered pair with a plain uniqueness
/// constraint. `last_message_id` is a cache of the message log, not a source
/// of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique identifier
    pub id: Uuid,
    /// Lexicographically smaller participant ID
    pub participant_low: Uuid,
    /// Lexicographically larger participant ID
    pub participant_high: Uuid,
    /// Denormalized pointer to the most recent message
    pub last_message_id: Option<Uuid>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last activity time
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Normalize an unordered pair into storage order
    #[must_use]
    pub fn normalize_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a.to_string() <= b.to_string() {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Whether the given identity participates in this conversation
    #[must_use]
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.participant_low == user_id || self.participant_high == user_id
    }

    /// Resolve the participant other than `user_id`
    ///
    /// Returns `None` when `user_id` is not a participant.
    #[must_use]
    pub fn other_participant(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_low == user_id {
            Some(self.participant_high)
        } else if self.participant_high == user_id {
            Some(self.participant_low)
        } else {
            None
        }
    }
}

/// A single immutable message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,
    /// Owning conversation
    pub conversation_id: Uuid,
    /// Sending identity
    pub sender_id: Uuid,
    /// Message text, non-empty after trimming
    pub content: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Caller-relative view of a conversation for list responses
///
/// The recipient is always the *other* participant, resolved against the
/// identity that requested the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: Uuid,
    /// The other participant, as seen by the caller
    pub recipient: PublicProfile,
    /// Most recent message, if any
    pub last_message: Option<Message>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last activity time
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pair_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            Conversation::normalize_pair(a, b),
            Conversation::normalize_pair(b, a)
        );
    }

    #[test]
    fn test_normalize_pair_orders_by_uuid_text() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (low, high) = Conversation::normalize_pair(a, b);
        assert!(low.to_string() <= high.to_string());
    }

    #[test]
    fn test_other_participant_resolution() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (low, high) = Conversation::normalize_pair(a, b);
        let conv = Conversation {
            id: Uuid::new_v4(),
            participant_low: low,
            participant_high: high,
            last_message_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(conv.other_participant(a), Some(b));
        assert_eq!(conv.other_participant(b), Some(a));
        assert_eq!(conv.other_participant(Uuid::new_v4()), None);
        assert!(conv.involves(a) && conv.involves(b));
    }
}
