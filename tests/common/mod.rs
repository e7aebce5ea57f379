// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use cogassess::{
    models::{
        assessment::{AssessmentState, NewAssessmentMetric},
        question::Catalog,
        user::ReminderRecipient,
    },
    repository::{
        Advance, AssessmentStore, ResultRecord, StoreError, reminders::ReminderSource,
    },
    scoring::TestOutcome,
    services::{
        assessment::AssessmentService,
        notifier::{Notifier, NotifyError},
    },
};
use rand::{SeedableRng, rngs::StdRng};

pub const CATALOG: &str = r#"{
    "questions": [
        {"id": "mood", "title": "Mood", "type": "radio", "required": true,
         "options": [{"value": "1", "label": "Low"}, {"value": "5", "label": "High"}]},
        {"id": "notes", "title": "Notes", "type": "text", "metrics_type": "keyboard"},
        {"id": "cpt", "title": "Attention", "type": "cpt",
         "options": [{"value": "X", "label": "targets"}]},
        {"id": "dst", "title": "Digit Span", "type": "dst",
         "options": [{"value": "3", "label": "initialSpan"}]},
        {"id": "tmt", "title": "Trails", "type": "tmt"}
    ]
}"#;

#[derive(Default)]
struct Tables {
    next_id: i64,
    assessments: Vec<AssessmentState>,
    answers: BTreeMap<(i64, String), String>,
    metrics: Vec<(i64, NewAssessmentMetric)>,
    tests: Vec<(i64, TestOutcome)>,
}

/// In-memory `AssessmentStore` with the same guarantees as the Postgres one:
/// one incomplete attempt per user, guarded position updates and
/// all-or-nothing writes. Every method holds the lock for its whole body.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail as if the database went away.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn assessments_for(&self, user_id: i64) -> Vec<AssessmentState> {
        let tables = self.tables.lock().unwrap();
        tables
            .assessments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn answer_count(&self) -> usize {
        self.tables.lock().unwrap().answers.len()
    }

    pub fn tests_for(&self, assessment_id: i64) -> Vec<TestOutcome> {
        let tables = self.tables.lock().unwrap();
        tables
            .tests
            .iter()
            .filter(|(id, _)| *id == assessment_id)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn metrics_for(&self, assessment_id: i64) -> Vec<NewAssessmentMetric> {
        let tables = self.tables.lock().unwrap();
        tables
            .metrics
            .iter()
            .filter(|(id, _)| *id == assessment_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Marks an attempt complete, finished at `day`.
    pub fn complete_on(&self, assessment_id: i64, day: NaiveDate) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(a) = tables.assessments.iter_mut().find(|a| a.id == assessment_id) {
            a.is_complete = true;
            a.updated_at = Some(day.and_hms_opt(9, 0, 0).unwrap().and_utc());
        }
    }
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn find_active(&self, user_id: i64) -> Result<Option<AssessmentState>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .assessments
            .iter()
            .find(|a| a.user_id == user_id && !a.is_complete)
            .cloned())
    }

    async fn active_or_create(
        &self,
        user_id: i64,
        order: &[i32],
    ) -> Result<AssessmentState, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(active) = tables
            .assessments
            .iter()
            .find(|a| a.user_id == user_id && !a.is_complete)
        {
            return Ok(active.clone());
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        tables.next_id += 1;
        let now = Some(Utc::now());
        let state = AssessmentState {
            id: tables.next_id,
            user_id,
            is_complete: false,
            question_order: order.to_vec(),
            current_question_index: 0,
            created_at: now,
            updated_at: now,
        };
        tables.assessments.push(state.clone());
        Ok(state)
    }

    async fn find_latest(&self, user_id: i64) -> Result<Option<AssessmentState>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mine = tables.assessments.iter().filter(|a| a.user_id == user_id);
        if let Some(active) = mine.clone().find(|a| !a.is_complete) {
            return Ok(Some(active.clone()));
        }
        Ok(mine.max_by_key(|a| (a.updated_at, a.id)).cloned())
    }

    async fn find_assessment(
        &self,
        user_id: i64,
        assessment_id: i64,
    ) -> Result<Option<AssessmentState>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .assessments
            .iter()
            .find(|a| a.id == assessment_id && a.user_id == user_id)
            .cloned())
    }

    async fn advance(&self, advance: Advance) -> Result<AssessmentState, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let state = tables
            .assessments
            .iter_mut()
            .find(|a| {
                a.id == advance.assessment_id
                    && a.current_question_index == advance.from_position
                    && !a.is_complete
            })
            .ok_or(StoreError::Conflict(advance.assessment_id))?;

        state.current_question_index = advance.to_position();
        state.is_complete = advance.complete;
        state.updated_at = Some(Utc::now());
        let updated = state.clone();

        match advance.record {
            Some(ResultRecord::Answer { question_id, value }) => {
                tables.answers.insert((advance.assessment_id, question_id), value);
            }
            Some(ResultRecord::Test(outcome)) => {
                tables.tests.push((advance.assessment_id, outcome));
            }
            None => {}
        }
        Ok(updated)
    }

    async fn set_position(
        &self,
        assessment_id: i64,
        from_position: i32,
        to_position: i32,
    ) -> Result<AssessmentState, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let state = tables
            .assessments
            .iter_mut()
            .find(|a| {
                a.id == assessment_id && a.current_question_index == from_position && !a.is_complete
            })
            .ok_or(StoreError::Conflict(assessment_id))?;
        state.current_question_index = to_position;
        Ok(state.clone())
    }

    async fn answers(&self, assessment_id: i64) -> Result<BTreeMap<String, String>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .answers
            .iter()
            .filter(|((id, _), _)| *id == assessment_id)
            .map(|((_, q), v)| (q.clone(), v.clone()))
            .collect())
    }

    async fn save_metrics(
        &self,
        assessment_id: i64,
        metrics: &[NewAssessmentMetric],
    ) -> Result<usize, StoreError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        tables
            .metrics
            .extend(metrics.iter().cloned().map(|m| (assessment_id, m)));
        Ok(metrics.len())
    }
}

/// A service over a fresh `MemoryStore` and a seeded random source.
pub fn service(seed: u64) -> (AssessmentService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let catalog = Catalog::from_json(CATALOG).expect("test catalog parses");
    let svc = AssessmentService::new(
        Arc::clone(&store),
        Arc::new(catalog),
        StdRng::seed_from_u64(seed),
    );
    (svc, store)
}

/// Reminder recipients plus the completion days of their attempts.
#[derive(Default)]
pub struct MemoryReminders {
    pub recipients: HashMap<String, Vec<ReminderRecipient>>,
    pub completed: HashSet<(i64, NaiveDate)>,
    /// Users whose completion lookup fails.
    pub broken: HashSet<i64>,
}

#[async_trait]
impl ReminderSource for MemoryReminders {
    async fn due_recipients(
        &self,
        reminder_time: &str,
    ) -> Result<Vec<ReminderRecipient>, StoreError> {
        Ok(self.recipients.get(reminder_time).cloned().unwrap_or_default())
    }

    async fn completed_on(&self, user_id: i64, day: NaiveDate) -> Result<bool, StoreError> {
        if self.broken.contains(&user_id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.completed.contains(&(user_id, day)))
    }
}

/// Records deliveries; fails for the configured users.
#[derive(Default)]
pub struct RecordingNotifier {
    pub failing: HashSet<i64>,
    pub sent: Mutex<Vec<i64>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_reminder(&self, recipient: &ReminderRecipient) -> Result<(), NotifyError> {
        if self.failing.contains(&recipient.id) {
            return Err(NotifyError::Delivery {
                user_id: recipient.id,
                reason: "mailbox unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(recipient.id);
        Ok(())
    }
}
