// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin fan-out and reply delivery.

use std::sync::Arc;

use futures::future::join_all;
use parley_core::types::{Account, Conversation, FileRef};
use parley_core::{ChannelAdapter, ParleyError};
use tracing::{debug, warn};

use crate::render;

pub struct Notifier {
    channel: Arc<dyn ChannelAdapter>,
    admin_ids: Vec<i64>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn ChannelAdapter>, admin_ids: Vec<i64>) -> Self {
        Self { channel, admin_ids }
    }

    /// Alerts every allow-listed admin about a customer message.
    ///
    /// Each admin gets the alert followed by any forwarded files. Delivery
    /// to one admin never waits on or fails because of another. Returns
    /// the number of admins that received everything.
    pub async fn alert_admins(
        &self,
        customer: &Account,
        conversation: &Conversation,
        content: Option<&str>,
        caption: Option<&str>,
        files: &[FileRef],
        needs_attention: u64,
    ) -> usize {
        let deliveries = self.admin_ids.iter().map(|&admin| async move {
            let alert = render::admin_alert(
                admin,
                customer,
                conversation,
                content.or(caption),
                files,
                needs_attention,
            );
            self.channel.send(alert).await?;
            for file in files {
                let forward = render::media_forward(admin, customer, conversation, file, caption);
                self.channel.send(forward).await?;
            }
            Ok::<_, ParleyError>(())
        });

        let results = join_all(deliveries).await;
        let mut delivered = 0;
        for (admin, result) in self.admin_ids.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    admin_id = admin,
                    conversation_id = conversation.id,
                    error = %e,
                    "failed to notify admin"
                ),
            }
        }
        debug!(
            conversation_id = conversation.id,
            delivered,
            admins = self.admin_ids.len(),
            "admin fan-out complete"
        );
        delivered
    }

    /// Sends an admin reply to the customer.
    ///
    /// The first file travels in the same message as the text; further
    /// files follow on their own.
    pub async fn deliver_reply(
        &self,
        customer: &Account,
        content: Option<&str>,
        files: &[FileRef],
    ) -> Result<(), ParleyError> {
        let chat_id = customer.external_id;
        let mut files = files.iter();
        self.channel
            .send(render::support_reply(chat_id, content, files.next()))
            .await?;
        for file in files {
            self.channel
                .send(render::support_reply(chat_id, None, Some(file)))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parley_core::types::{AttachmentKind, ConversationStatus, Variant};
    use parley_test_utils::MockChannel;
    use tracing_test::traced_test;

    use super::*;

    fn customer() -> Account {
        Account {
            id: 3,
            external_id: 300,
            username: None,
            first_name: "Cara".into(),
            last_name: None,
            is_admin: false,
            created_at: "2026-10-19T10:00:00.000Z".into(),
            updated_at: "2026-10-19T10:00:00.000Z".into(),
        }
    }

    fn chat() -> Conversation {
        Conversation {
            id: 12,
            customer_id: 3,
            variant: Variant::Threaded,
            status: ConversationStatus::Active,
            subject: None,
            unread_count: 1,
            created_at: "2026-10-19T10:00:00.000Z".into(),
            updated_at: "2026-10-19T10:00:00.000Z".into(),
            last_message_at: Some("2026-10-19T10:00:00.000Z".into()),
            closed_at: None,
        }
    }

    fn photo() -> FileRef {
        FileRef {
            handle: "AgADphoto".into(),
            name: "photo.jpg".into(),
            kind: AttachmentKind::Photo,
            size: 2048,
        }
    }

    #[tokio::test]
    async fn every_admin_gets_alert_and_forwarded_media() {
        let channel = Arc::new(MockChannel::new());
        let notifier = Notifier::new(channel.clone(), vec![1, 2]);

        let delivered = notifier
            .alert_admins(&customer(), &chat(), None, Some("look"), &[photo()], 1)
            .await;
        assert_eq!(delivered, 2);

        for admin in [1, 2] {
            let sent = channel.sent_to(admin).await;
            assert_eq!(sent.len(), 2);
            assert!(sent[0].text.contains("Chat #12"));
            assert!(sent[0].text.contains("look"));
            assert_eq!(sent[1].attachment, Some(photo()));
            assert!(sent[1].text.starts_with("📷 Photo from Cara (Chat #12)"));
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn one_failing_admin_does_not_block_the_others() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_sends_to(1).await;
        let notifier = Notifier::new(channel.clone(), vec![1, 2, 3]);

        let delivered = notifier
            .alert_admins(&customer(), &chat(), Some("hello"), None, &[], 1)
            .await;

        assert_eq!(delivered, 2);
        assert!(channel.sent_to(1).await.is_empty());
        assert_eq!(channel.sent_to(2).await.len(), 1);
        assert_eq!(channel.sent_to(3).await.len(), 1);
        assert!(logs_contain("failed to notify admin"));
    }

    #[tokio::test]
    async fn reply_with_photo_is_one_message() {
        let channel = Arc::new(MockChannel::new());
        let notifier = Notifier::new(channel.clone(), vec![1]);

        notifier
            .deliver_reply(&customer(), Some("here you go"), &[photo()])
            .await
            .unwrap();

        let sent = channel.sent_to(300).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachment, Some(photo()));
        assert!(sent[0].text.contains("here you go"));
    }

    #[tokio::test]
    async fn failed_reply_delivery_is_an_error() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_sends_to(300).await;
        let notifier = Notifier::new(channel.clone(), vec![1]);

        let err = notifier
            .deliver_reply(&customer(), Some("hi"), &[])
            .await
            .unwrap_err();
        assert!(err.is_infrastructure());
    }
}
