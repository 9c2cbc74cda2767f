// ABOUTME: Integration tests for the conversation registry and message log
// ABOUTME: Covers pair uniqueness under concurrency, access control, and ordering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use sqlx::Row;
use uuid::Uuid;

use agrilink::database::MessagingManager;
use agrilink::errors::ErrorCode;

use common::{create_user, setup_database};

#[tokio::test]
async fn test_get_or_create_is_idempotent_across_argument_order() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let messaging = MessagingManager::new(database.pool());

    let (first, created_first) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();
    assert!(created_first);

    let (second, created_second) = messaging
        .get_or_create_conversation(bob.id, alice.id)
        .await
        .unwrap();
    assert!(!created_second);
    assert_eq!(first.id, second.id);

    let row = sqlx::query("SELECT COUNT(*) AS count FROM conversations")
        .fetch_one(&database.pool())
        .await
        .unwrap();
    let count: i64 = row.get("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_concurrent_get_or_create_converges_on_one_conversation() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let pool = database.pool();
        let (caller, recipient) = if i % 2 == 0 {
            (alice.id, bob.id)
        } else {
            (bob.id, alice.id)
        };
        handles.push(tokio::spawn(async move {
            MessagingManager::new(pool)
                .get_or_create_conversation(caller, recipient)
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    let mut created_count = 0;
    for handle in handles {
        let (conversation, created) = handle.await.unwrap();
        ids.push(conversation.id);
        if created {
            created_count += 1;
        }
    }

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(created_count, 1);

    let row = sqlx::query("SELECT COUNT(*) AS count FROM conversations")
        .fetch_one(&database.pool())
        .await
        .unwrap();
    let count: i64 = row.get("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_self_conversation_is_rejected() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;

    let messaging = MessagingManager::new(database.pool());
    let error = messaging
        .get_or_create_conversation(alice.id, alice.id)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_unknown_recipient_is_rejected() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;

    let messaging = MessagingManager::new(database.pool());
    let error = messaging
        .get_or_create_conversation(alice.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_whitespace_message_is_rejected_and_not_persisted() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let messaging = MessagingManager::new(database.pool());
    let (conversation, _) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();

    let error = messaging
        .append_message(conversation.id, alice.id, "   \n\t  ")
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidInput);

    let messages = messaging
        .list_messages(conversation.id, alice.id)
        .await
        .unwrap();
    assert!(messages.is_empty());

    // The rejected append must not disturb the conversation either
    let unchanged = messaging
        .get_conversation(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.last_message_id, None);
}

#[tokio::test]
async fn test_non_participant_cannot_send_or_read() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;
    let mallory = create_user(&database, "Mallory").await;

    let messaging = MessagingManager::new(database.pool());
    let (conversation, _) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();
    messaging
        .append_message(conversation.id, alice.id, "hello")
        .await
        .unwrap();

    let send_error = messaging
        .append_message(conversation.id, mallory.id, "let me in")
        .await
        .unwrap_err();
    assert_eq!(send_error.code, ErrorCode::PermissionDenied);

    let read_error = messaging
        .list_messages(conversation.id, mallory.id)
        .await
        .unwrap_err();
    assert_eq!(read_error.code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_messages_come_back_oldest_first() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let messaging = MessagingManager::new(database.pool());
    let (conversation, _) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();

    for i in 0..5 {
        let sender = if i % 2 == 0 { alice.id } else { bob.id };
        messaging
            .append_message(conversation.id, sender, &format!("message {i}"))
            .await
            .unwrap();
    }

    let messages = messaging
        .list_messages(conversation.id, bob.id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 5);
    for (i, message) in messages.iter().enumerate() {
        assert_eq!(message.content, format!("message {i}"));
    }
    for pair in messages.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[tokio::test]
async fn test_append_refreshes_the_last_message_cache() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let messaging = MessagingManager::new(database.pool());
    let (conversation, _) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();

    let first = messaging
        .append_message(conversation.id, alice.id, "first")
        .await
        .unwrap();
    let after_first = messaging
        .get_conversation(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_first.last_message_id, Some(first.id));

    let second = messaging
        .append_message(conversation.id, bob.id, "second")
        .await
        .unwrap();
    let after_second = messaging
        .get_conversation(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after_second.last_message_id, Some(second.id));
    assert!(after_second.updated_at >= after_first.updated_at);
}

#[tokio::test]
async fn test_list_conversations_resolves_recipient_and_orders_by_activity() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;
    let carol = create_user(&database, "Carol").await;

    let messaging = MessagingManager::new(database.pool());
    let (with_bob, _) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();
    let (with_carol, _) = messaging
        .get_or_create_conversation(alice.id, carol.id)
        .await
        .unwrap();

    // Touch the Bob conversation last so it surfaces first
    messaging
        .append_message(with_carol.id, carol.id, "from carol")
        .await
        .unwrap();
    messaging
        .append_message(with_bob.id, bob.id, "from bob")
        .await
        .unwrap();

    let summaries = messaging.list_conversations(alice.id).await.unwrap();
    assert_eq!(summaries.len(), 2);

    assert_eq!(summaries[0].id, with_bob.id);
    assert_eq!(summaries[0].recipient.id, bob.id);
    assert_eq!(summaries[0].recipient.name, "Bob");
    assert_eq!(
        summaries[0].last_message.as_ref().unwrap().content,
        "from bob"
    );

    assert_eq!(summaries[1].id, with_carol.id);
    assert_eq!(summaries[1].recipient.id, carol.id);

    // Bob sees the same conversation with Alice as the recipient
    let bob_view = messaging.list_conversations(bob.id).await.unwrap();
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].recipient.id, alice.id);

    // An uninvolved user sees nothing
    let dave = create_user(&database, "Dave").await;
    assert!(messaging.list_conversations(dave.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_summarize_conversation_is_caller_relative() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let messaging = MessagingManager::new(database.pool());
    let (conversation, _) = messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();

    // Before any message the summary carries no last message
    let fresh = messaging
        .summarize_conversation(&conversation, alice.id)
        .await
        .unwrap();
    assert_eq!(fresh.recipient.id, bob.id);
    assert_eq!(fresh.recipient.name, "Bob");
    assert!(fresh.last_message.is_none());

    let sent = messaging
        .append_message(conversation.id, alice.id, "hello")
        .await
        .unwrap();
    let conversation = messaging
        .get_conversation(conversation.id)
        .await
        .unwrap()
        .unwrap();

    // Each participant sees the other as the recipient, never themselves
    let alice_view = messaging
        .summarize_conversation(&conversation, alice.id)
        .await
        .unwrap();
    assert_eq!(alice_view.recipient.id, bob.id);
    assert_eq!(alice_view.last_message.as_ref().unwrap().id, sent.id);

    let bob_view = messaging
        .summarize_conversation(&conversation, bob.id)
        .await
        .unwrap();
    assert_eq!(bob_view.recipient.id, alice.id);
    assert_eq!(bob_view.recipient.name, "Alice");

    let mallory = create_user(&database, "Mallory").await;
    let error = messaging
        .summarize_conversation(&conversation, mallory.id)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_conversation_without_messages_lists_with_empty_last_message() {
    let (database, _dir) = setup_database().await;
    let alice = create_user(&database, "Alice").await;
    let bob = create_user(&database, "Bob").await;

    let messaging = MessagingManager::new(database.pool());
    messaging
        .get_or_create_conversation(alice.id, bob.id)
        .await
        .unwrap();

    let summaries = messaging.list_conversations(alice.id).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].last_message.is_none());
}
