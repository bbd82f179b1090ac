use async_trait::async_trait;
use ridepool_shared::models::events::EMAIL_REQUESTED_TOPIC;
use ridepool_shared::Masked;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::events::EventPublisher;
use crate::models::profile::is_valid_email;
use crate::{CoreError, CoreResult, StoreResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub filename: String,
    /// Base64 body.
    pub content: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    pub fn plain(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: Some(text.into()),
            html: None,
            cc: Vec::new(),
            bcc: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !is_valid_email(self.to.trim()) {
            return Err(CoreError::invalid("recipient address is not valid"));
        }
        if let Some(bad) = self
            .cc
            .iter()
            .chain(self.bcc.iter())
            .find(|addr| !is_valid_email(addr.trim()))
        {
            return Err(CoreError::invalid(format!(
                "copy address {} is not valid",
                Masked(bad.as_str())
            )));
        }
        if self.subject.trim().is_empty() {
            return Err(CoreError::invalid("subject is required"));
        }
        let has_body = |b: &Option<String>| b.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_body(&self.text) && !has_body(&self.html) {
            return Err(CoreError::invalid("either text or html body is required"));
        }
        if self.attachments.iter().any(|a| a.filename.trim().is_empty()) {
            return Err(CoreError::invalid("attachments need a filename"));
        }
        Ok(())
    }
}

/// Fire-and-forget mail delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> StoreResult<()>;
}

/// Writes messages to the log instead of sending them.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, message: &EmailMessage) -> StoreResult<()> {
        info!(
            to = %Masked(message.to.as_str()),
            subject = %message.subject,
            cc = message.cc.len(),
            attachments = message.attachments.len(),
            "Email notification (not delivered, logging notifier)"
        );
        Ok(())
    }
}

/// Hands messages to the mailer over the event bus.
pub struct EventNotifier {
    publisher: Arc<dyn EventPublisher>,
}

impl EventNotifier {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn send(&self, message: &EmailMessage) -> StoreResult<()> {
        let payload = serde_json::to_string(message)
            .map_err(|e| crate::StoreError::Publish(e.to_string()))?;
        self.publisher
            .publish(EMAIL_REQUESTED_TOPIC, message.to.trim(), &payload)
            .await?;
        info!("Queued email to {}", Masked(message.to.as_str()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl EventPublisher for Recorder {
        async fn publish(&self, topic: &str, key: &str, payload: &str) -> StoreResult<()> {
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string(), payload.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_body_required() {
        let mut msg = EmailMessage::plain("rider@example.com", "Your booking", "See you soon");
        assert!(msg.validate().is_ok());
        msg.text = None;
        assert!(msg.validate().is_err());
        msg.html = Some("<p>See you soon</p>".into());
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_bad_cc_rejected() {
        let mut msg = EmailMessage::plain("rider@example.com", "Hi", "Body");
        msg.cc.push("not-an-address".into());
        assert!(msg.validate().is_err());
    }

    #[tokio::test]
    async fn test_event_notifier_publishes_json() {
        let recorder = Arc::new(Recorder::default());
        let notifier = EventNotifier::new(recorder.clone());

        let msg = EmailMessage::plain("rider@example.com", "Booking confirmed", "2 seats");
        notifier.send(&msg).await.unwrap();

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, EMAIL_REQUESTED_TOPIC);
        assert_eq!(sent[0].1, "rider@example.com");
        let decoded: EmailMessage = serde_json::from_str(&sent[0].2).unwrap();
        assert_eq!(decoded.subject, "Booking confirmed");
    }
}
