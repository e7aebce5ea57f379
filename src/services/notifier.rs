// src/services/notifier.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::models::user::ReminderRecipient;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to deliver reminder to user {user_id}: {reason}")]
    Delivery { user_id: i64, reason: String },
}

/// Delivers reminder messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reminder(&self, recipient: &ReminderRecipient) -> Result<(), NotifyError>;
}

/// Writes reminders to the log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reminder(&self, recipient: &ReminderRecipient) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = recipient.id,
            to = %recipient.email,
            "Reminder: please complete your daily assessment"
        );
        Ok(())
    }
}
