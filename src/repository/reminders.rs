// src/repository/reminders.rs

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};

use super::{PgStore, StoreError};
use crate::models::user::ReminderRecipient;

/// Where the reminder scheduler finds who to remind.
#[async_trait]
pub trait ReminderSource: Send + Sync {
    /// Subjects with reminders enabled at `reminder_time` ("HH:MM", UTC).
    async fn due_recipients(&self, reminder_time: &str)
    -> Result<Vec<ReminderRecipient>, StoreError>;

    /// Whether the subject finished an attempt on the given UTC day.
    async fn completed_on(&self, user_id: i64, day: NaiveDate) -> Result<bool, StoreError>;
}

fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = day
        .checked_add_days(Days::new(1))
        .unwrap_or(day)
        .and_time(chrono::NaiveTime::MIN)
        .and_utc();
    (start, end)
}

#[async_trait]
impl ReminderSource for PgStore {
    async fn due_recipients(
        &self,
        reminder_time: &str,
    ) -> Result<Vec<ReminderRecipient>, StoreError> {
        let recipients = sqlx::query_as::<_, ReminderRecipient>(
            r#"
            SELECT id, email FROM users
            WHERE email_notifications_enabled = true AND reminder_time = $1
            "#,
        )
        .bind(reminder_time)
        .fetch_all(self.pool())
        .await?;
        Ok(recipients)
    }

    async fn completed_on(&self, user_id: i64, day: NaiveDate) -> Result<bool, StoreError> {
        let (start, end) = day_bounds(day);
        let completed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM assessments
                WHERE user_id = $1 AND is_complete = true
                  AND updated_at >= $2 AND updated_at < $3
            )
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(self.pool())
        .await?;
        Ok(completed)
    }
}

impl PgStore {
    /// Stores a subject's reminder preferences.
    pub async fn update_notification_preferences(
        &self,
        user_id: i64,
        enabled: bool,
        reminder_time: &str,
        time_zone: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email_notifications_enabled = $2, reminder_time = $3, time_zone = $4
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(enabled)
        .bind(reminder_time)
        .bind(time_zone)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
