// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// 24-hour "HH:MM".
pub static REMINDER_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub email_notifications_enabled: bool,

    /// UTC time of day ("HH:MM") at which a reminder is due.
    pub reminder_time: Option<String>,

    pub time_zone: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A subject who should receive a reminder.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ReminderRecipient {
    pub id: i64,
    pub email: String,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        email(message = "A valid email address is required."),
        length(max = 254)
    )]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for updating reminder preferences.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferencesRequest {
    pub enabled: bool,
    #[validate(regex(
        path = *REMINDER_TIME_RE,
        message = "Reminder time must be HH:MM (24-hour, UTC)."
    ))]
    pub reminder_time: String,
    #[validate(length(min = 1, max = 64))]
    pub time_zone: String,
}
