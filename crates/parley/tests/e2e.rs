// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete support desk.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a mock
//! transport. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use parley_core::types::{Action, AttachmentKind, ConversationStatus, FileRef, Variant};
use parley_core::{ChannelAdapter, ParleyError, StorageAdapter};
use parley_desk::{AdminSession, DeskLoop};
use parley_test_utils::TestHarness;
use tokio_util::sync::CancellationToken;

const ADMIN: i64 = 1;
const OTHER_ADMIN: i64 = 2;
const CUSTOMER: i64 = 100;

async fn harness(variant: Variant) -> TestHarness {
    TestHarness::builder()
        .with_variant(variant)
        .with_admins(vec![ADMIN, OTHER_ADMIN])
        .build()
        .await
        .unwrap()
}

async fn account_id(harness: &TestHarness, external_id: i64) -> i64 {
    harness
        .storage()
        .get_account_by_external_id(external_id)
        .await
        .unwrap()
        .expect("account should exist")
        .id
}

// ---- Scenario 1: first customer message ----

#[tokio::test]
async fn first_message_opens_a_conversation_and_alerts_every_admin() {
    for variant in [Variant::Ticketed, Variant::Threaded] {
        let harness = harness(variant).await;
        harness.customer_says(CUSTOMER, "my internet is down").await;

        let customer = account_id(&harness, CUSTOMER).await;
        let conversation = harness
            .storage()
            .find_active_conversation(customer)
            .await
            .unwrap()
            .expect("conversation should be open");
        assert_eq!(conversation.status, variant.initial_status());

        let messages = harness
            .storage()
            .list_messages(conversation.id, 10, 0)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].from_customer);
        assert_eq!(messages[0].content.as_deref(), Some("my internet is down"));

        for admin in [ADMIN, OTHER_ADMIN] {
            let alerts = harness.sent_to(admin).await;
            assert_eq!(alerts.len(), 1, "admin {admin} should get one alert");
            assert!(alerts[0].text.contains("my internet is down"));
        }
        assert_eq!(harness.sent_to(CUSTOMER).await.len(), 1);
    }
}

// ---- Scenario 2: idle admin free text ----

#[tokio::test]
async fn idle_admin_text_changes_nothing() {
    let harness = harness(Variant::Ticketed).await;
    harness.admin_says(ADMIN, "hello?").await;

    let open = harness
        .storage()
        .count_conversations(ConversationStatus::Open)
        .await
        .unwrap();
    assert_eq!(open, 0);
    assert_eq!(harness.channel().sent_count().await, 0);
}

// ---- Scenario 3: ticket reply ends the session ----

#[tokio::test]
async fn ticket_reply_answers_and_detaches_admin() {
    let harness = harness(Variant::Ticketed).await;
    for customer in 101..=107 {
        harness.customer_says(customer, &format!("problem {customer}")).await;
    }

    harness.click(ADMIN, Action::AdminReply(7)).await;
    assert_eq!(harness.router().sessions().state(ADMIN), AdminSession::RepliesTo(7));

    harness.admin_says(ADMIN, "please restart your router").await;

    let ticket = harness.storage().get_conversation(7).await.unwrap().unwrap();
    assert_eq!(ticket.status, ConversationStatus::Answered);
    let messages = harness.storage().list_messages(7, 10, 0).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(!messages[1].from_customer);
    assert_eq!(
        messages[1].content.as_deref(),
        Some("please restart your router")
    );

    assert_eq!(harness.router().sessions().state(ADMIN), AdminSession::Idle);
    let delivered = harness.sent_to(107).await;
    assert!(
        delivered
            .last()
            .unwrap()
            .text
            .ends_with("please restart your router")
    );

    // Other tickets are untouched.
    let other = harness.storage().get_conversation(6).await.unwrap().unwrap();
    assert_eq!(other.status, ConversationStatus::Open);
}

// ---- Scenario 4: chat reply keeps the session ----

#[tokio::test]
async fn chat_session_survives_continue() {
    let harness = harness(Variant::Threaded).await;
    for customer in 101..=107 {
        harness.customer_says(customer, "hi").await;
    }

    harness.click(ADMIN, Action::AdminReply(7)).await;
    harness.admin_says(ADMIN, "please restart your router").await;
    let cb = harness.click(ADMIN, Action::ContinueChat).await;
    assert!(harness.answer_for(&cb).await.is_some());
    assert_eq!(harness.router().sessions().state(ADMIN), AdminSession::RepliesTo(7));

    harness.admin_says(ADMIN, "did that help?").await;

    let messages = harness.storage().list_messages(7, 10, 0).await.unwrap();
    let replies: Vec<_> = messages
        .iter()
        .filter(|m| !m.from_customer)
        .filter_map(|m| m.content.as_deref())
        .collect();
    assert_eq!(replies, vec!["please restart your router", "did that help?"]);

    let chat = harness.storage().get_conversation(7).await.unwrap().unwrap();
    assert_eq!(chat.status, ConversationStatus::Active);
    assert_eq!(chat.unread_count, 0);
}

#[tokio::test]
async fn finishing_a_chat_archives_and_detaches() {
    let harness = harness(Variant::Threaded).await;
    harness.customer_says(CUSTOMER, "hi").await;
    harness.click(ADMIN, Action::AdminReply(1)).await;
    harness.admin_says(ADMIN, "hello!").await;

    harness.click(ADMIN, Action::Finish(1)).await;

    let chat = harness.storage().get_conversation(1).await.unwrap().unwrap();
    assert_eq!(chat.status, ConversationStatus::Archived);
    assert!(chat.closed_at.is_some());
    assert_eq!(harness.router().sessions().state(ADMIN), AdminSession::Idle);

    // The next customer message starts a fresh chat.
    harness.customer_says(CUSTOMER, "one more thing").await;
    let customer = account_id(&harness, CUSTOMER).await;
    let active = harness
        .storage()
        .find_active_conversation(customer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, 2);
}

// ---- Scenario 5: concurrent first messages ----

#[tokio::test]
async fn simultaneous_first_messages_share_one_conversation() {
    let harness = harness(Variant::Ticketed).await;
    let router = harness.router();

    tokio::join!(
        router.handle(TestHarness::text_event(CUSTOMER, "first")),
        router.handle(TestHarness::text_event(CUSTOMER, "second")),
    );

    let open = harness
        .storage()
        .count_conversations(ConversationStatus::Open)
        .await
        .unwrap();
    assert_eq!(open, 1);

    let customer = account_id(&harness, CUSTOMER).await;
    let ticket = harness
        .storage()
        .find_active_conversation(customer)
        .await
        .unwrap()
        .unwrap();
    let messages = harness.storage().list_messages(ticket.id, 10, 0).await.unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn desk_loop_serializes_one_sender_and_drains_on_close() {
    let harness = harness(Variant::Threaded).await;
    for i in 0..5 {
        harness
            .channel()
            .inject(TestHarness::text_event(CUSTOMER, &format!("burst {i}")))
            .await;
    }
    harness.channel().close();

    let desk = DeskLoop::new(
        Arc::clone(harness.channel()) as Arc<dyn ChannelAdapter>,
        Arc::clone(harness.router()),
    );
    tokio::time::timeout(Duration::from_secs(10), desk.run(CancellationToken::new()))
        .await
        .expect("desk loop should stop once the channel closes")
        .unwrap();

    let active = harness
        .storage()
        .count_conversations(ConversationStatus::Active)
        .await
        .unwrap();
    assert_eq!(active, 1);
    let messages = harness.storage().list_messages(1, 10, 0).await.unwrap();
    assert_eq!(messages.len(), 5);
    assert_eq!(harness.sent_to(CUSTOMER).await.len(), 5);
}

#[tokio::test]
async fn transport_error_mentioning_closed_does_not_stop_the_loop() {
    let harness = harness(Variant::Threaded).await;
    harness
        .channel()
        .fail_next_receive(ParleyError::Channel {
            message: "upstream closed the connection".into(),
            source: None,
        })
        .await;
    harness
        .channel()
        .inject(TestHarness::text_event(CUSTOMER, "still there?"))
        .await;
    harness.channel().close();

    let desk = DeskLoop::new(
        Arc::clone(harness.channel()) as Arc<dyn ChannelAdapter>,
        Arc::clone(harness.router()),
    );
    tokio::time::timeout(Duration::from_secs(10), desk.run(CancellationToken::new()))
        .await
        .expect("desk loop should stop once the channel closes")
        .unwrap();

    let messages = harness.storage().list_messages(1, 10, 0).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(harness.sent_to(CUSTOMER).await.len(), 1);
}

#[tokio::test]
async fn desk_loop_stops_on_cancel() {
    let harness = harness(Variant::Threaded).await;
    let desk = DeskLoop::new(
        Arc::clone(harness.channel()) as Arc<dyn ChannelAdapter>,
        Arc::clone(harness.router()),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    tokio::time::timeout(Duration::from_secs(5), desk.run(cancel))
        .await
        .expect("desk loop should honour cancellation")
        .unwrap();
}

// ---- Scenario 6: history paging ----

#[tokio::test]
async fn second_history_page_holds_the_tail() {
    let harness = harness(Variant::Threaded).await;
    for i in 1..=15 {
        harness.customer_says(CUSTOMER, &format!("m{i}")).await;
    }

    let page = harness.router().store().page_messages(1, 1).await.unwrap();
    let contents: Vec<_> = page
        .items
        .iter()
        .filter_map(|m| m.content.as_deref())
        .collect();
    assert_eq!(contents, vec!["m11", "m12", "m13", "m14", "m15"]);
    assert!(page.has_prev());
    assert!(!page.has_next());
}

#[tokio::test]
async fn detailed_history_says_when_the_newest_messages_are_left_out() {
    let harness = TestHarness::builder()
        .with_variant(Variant::Threaded)
        .with_admins(vec![ADMIN])
        .with_history_limit(3)
        .build()
        .await
        .unwrap();
    for i in 1..=5 {
        harness.customer_says(CUSTOMER, &format!("m{i}")).await;
    }

    let before = harness.sent_to(ADMIN).await.len();
    harness.click(ADMIN, Action::DetailedHistory(1)).await;
    let sent = harness.sent_to(ADMIN).await.split_off(before);
    let bodies: Vec<_> = sent.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(bodies.len(), 5, "header, three messages, footer");
    assert!(bodies.iter().any(|t| t.contains("m3")));
    assert!(!bodies.iter().any(|t| t.contains("m4")));
    let footer = sent.last().unwrap();
    assert!(footer.text.contains("first 3 of 5"));
}

// ---- Properties ----

#[tokio::test]
async fn closing_twice_keeps_the_first_close() {
    let harness = harness(Variant::Ticketed).await;
    harness.customer_says(CUSTOMER, "printer jammed").await;

    harness.click(ADMIN, Action::Close(1)).await;
    let first = harness.storage().get_conversation(1).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let cb = harness.click(ADMIN, Action::Close(1)).await;
    let second = harness.storage().get_conversation(1).await.unwrap().unwrap();

    assert_eq!(first.status, ConversationStatus::Closed);
    assert_eq!(first.closed_at, second.closed_at);
    assert_eq!(first.updated_at, second.updated_at);
    let notice = harness.answer_for(&cb).await.flatten().unwrap();
    assert!(!notice.contains("⚠️"));
}

#[tokio::test]
async fn sessions_of_different_admins_are_isolated() {
    let harness = harness(Variant::Threaded).await;
    harness.customer_says(101, "a").await;
    harness.customer_says(102, "b").await;

    harness.click(ADMIN, Action::AdminReply(1)).await;
    assert_eq!(harness.router().sessions().state(OTHER_ADMIN), AdminSession::Idle);

    harness.click(OTHER_ADMIN, Action::AdminReply(2)).await;
    harness.click(ADMIN, Action::AdminMenu).await;

    assert_eq!(harness.router().sessions().state(ADMIN), AdminSession::Idle);
    assert_eq!(
        harness.router().sessions().state(OTHER_ADMIN),
        AdminSession::RepliesTo(2)
    );

    harness.admin_says(OTHER_ADMIN, "reply to b").await;
    assert_eq!(harness.storage().list_messages(1, 10, 0).await.unwrap().len(), 1);
    assert_eq!(harness.storage().list_messages(2, 10, 0).await.unwrap().len(), 2);
}

#[tokio::test]
async fn customer_never_holds_two_open_conversations() {
    let harness = harness(Variant::Ticketed).await;
    harness.customer_says(CUSTOMER, "first").await;
    harness.customer_says(CUSTOMER, "again").await;
    let cb = harness.click(CUSTOMER, Action::CreateTicket).await;

    assert_eq!(
        harness
            .storage()
            .count_conversations(ConversationStatus::Open)
            .await
            .unwrap(),
        1
    );
    let notice = harness.answer_for(&cb).await.flatten().unwrap();
    assert!(notice.contains("#1"));
}

#[tokio::test]
async fn messages_keep_their_arrival_order() {
    let harness = harness(Variant::Threaded).await;
    harness.customer_says(CUSTOMER, "one").await;
    harness.click(ADMIN, Action::AdminReply(1)).await;
    harness.admin_says(ADMIN, "two").await;
    harness.customer_says(CUSTOMER, "three").await;

    let messages = harness.storage().list_messages(1, 10, 0).await.unwrap();
    let contents: Vec<_> = messages.iter().filter_map(|m| m.content.as_deref()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
    assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn customer_photo_is_stored_and_forwarded() {
    let harness = harness(Variant::Threaded).await;
    let photo = FileRef {
        handle: "AgADscreenshot".into(),
        name: "photo.jpg".into(),
        kind: AttachmentKind::Photo,
        size: 4096,
    };
    harness
        .sends_file(CUSTOMER, photo.clone(), Some("error screen"))
        .await;

    let messages = harness.storage().list_messages(1, 10, 0).await.unwrap();
    assert_eq!(messages[0].content.as_deref(), Some("error screen"));
    assert_eq!(messages[0].attachments.len(), 1);
    assert_eq!(messages[0].attachments[0].file, photo);

    let to_admin = harness.sent_to(ADMIN).await;
    assert!(to_admin.iter().any(|m| m.attachment.as_ref() == Some(&photo)));
}
