// src/services/mod.rs

pub mod assessment;
pub mod notifier;
pub mod scheduler;

pub use assessment::{AssessmentError, AssessmentService, QuestionView, Step};
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use scheduler::{ReminderScheduler, ReminderSummary};
