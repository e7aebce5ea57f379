// src/services/scheduler.rs

//! Daily reminder scheduler.
//!
//! A background task wakes on a fixed interval, looks up subjects whose
//! reminder time matches the current UTC minute and who have not completed an
//! attempt today, and notifies them concurrently.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{task::JoinSet, time::MissedTickBehavior};

use crate::{
    models::user::ReminderRecipient,
    repository::reminders::ReminderSource,
    services::notifier::Notifier,
};

/// Outcome of one reminder pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderSummary {
    /// Subjects whose reminder time matched.
    pub due: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct ReminderScheduler<R, N> {
    source: Arc<R>,
    notifier: Arc<N>,
    interval: Duration,
}

impl<R, N> ReminderScheduler<R, N>
where
    R: ReminderSource + 'static,
    N: Notifier + 'static,
{
    pub fn new(source: Arc<R>, notifier: Arc<N>, interval: Duration) -> Self {
        Self {
            source,
            notifier,
            interval,
        }
    }

    /// Runs the check on every tick until the returned handle is aborted.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tracing::info!(interval_secs = self.interval.as_secs(), "Starting reminder scheduler");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.run_reminder_check(Utc::now()).await;
            }
        })
    }

    pub async fn run_reminder_check(&self, now: DateTime<Utc>) -> ReminderSummary {
        let reminder_time = now.format("%H:%M").to_string();
        tracing::debug!(utc_time = %reminder_time, "Running reminder check");

        let recipients = match self.source.due_recipients(&reminder_time).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!("Failed to load reminder recipients: {}", e);
                return ReminderSummary::default();
            }
        };

        let mut summary = ReminderSummary {
            due: recipients.len(),
            ..Default::default()
        };

        let today = now.date_naive();
        let mut tasks = JoinSet::new();
        for recipient in recipients {
            let source = Arc::clone(&self.source);
            let notifier = Arc::clone(&self.notifier);
            tasks.spawn(async move {
                remind(source.as_ref(), notifier.as_ref(), recipient, today).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Delivery::Sent) => summary.sent += 1,
                Ok(Delivery::Skipped) => summary.skipped += 1,
                Ok(Delivery::Failed) => summary.failed += 1,
                Err(e) => {
                    tracing::error!("Reminder task panicked: {}", e);
                    summary.failed += 1;
                }
            }
        }

        if summary.due > 0 {
            tracing::info!(
                due = summary.due,
                sent = summary.sent,
                skipped = summary.skipped,
                failed = summary.failed,
                "Reminder check finished"
            );
        }
        summary
    }
}

enum Delivery {
    Sent,
    Skipped,
    Failed,
}

async fn remind<R, N>(
    source: &R,
    notifier: &N,
    recipient: ReminderRecipient,
    today: chrono::NaiveDate,
) -> Delivery
where
    R: ReminderSource + ?Sized,
    N: Notifier + ?Sized,
{
    match source.completed_on(recipient.id, today).await {
        Ok(true) => return Delivery::Skipped,
        Ok(false) => {}
        Err(e) => {
            tracing::error!(user_id = recipient.id, "Failed to check assessment completion: {}", e);
            return Delivery::Failed;
        }
    }

    match notifier.send_reminder(&recipient).await {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            tracing::warn!(user_id = recipient.id, "{}", e);
            Delivery::Failed
        }
    }
}
