// src/engagement/mod.rs

//! Engagement records: the mutable state the engine reasons about.
//!
//! - [`store`] defines the read-only [`HistoryLookup`] the engine consumes and
//!   the [`EngagementStore`] the service writes through.
//! - [`memory`] is an in-process store with the same uniqueness guarantees a
//!   database would give.

pub mod memory;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CollectionId, EngagementId, QuestionId, StepId, UserId};

pub use memory::MemoryStore;
pub use store::{EngagementStore, HistoryLookup};

/// One user's pass through a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: EngagementId,
    pub collection_id: CollectionId,
    pub user_id: UserId,
    pub started: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<DateTime<Utc>>,
}

impl Engagement {
    pub fn new(collection_id: CollectionId, user_id: UserId, started: DateTime<Utc>) -> Self {
        Self {
            id: EngagementId::generate(),
            collection_id,
            user_id,
            started,
            finished: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }
}

/// A single answer inside an attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    /// The question's code; filled in from the catalog when omitted.
    #[serde(default)]
    pub question_identifier: String,
    #[serde(default)]
    pub value: Value,
    /// Set when the attempt was scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
}

impl Answer {
    pub fn new(question_id: QuestionId, value: Value) -> Self {
        Self {
            question_id,
            question_identifier: String::new(),
            value,
            is_valid: None,
        }
    }
}

/// One submission of a step. Only the last attempt of a detail counts for
/// dependencies and scoring; earlier ones are history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Per-step record inside an engagement; unique per (engagement, step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementDetail {
    pub engagement_id: EngagementId,
    pub step_id: StepId,
    pub started: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responses: Vec<Attempt>,
}

impl EngagementDetail {
    pub fn new(engagement_id: EngagementId, step_id: StepId, started: DateTime<Utc>) -> Self {
        Self {
            engagement_id,
            step_id,
            started,
            finished: None,
            responses: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// The authoritative attempt, if any.
    pub fn last_attempt(&self) -> Option<&Attempt> {
        self.responses.last()
    }

    /// Answers of the last attempt (empty when nothing was submitted).
    pub fn last_answers(&self) -> &[Answer] {
        self.last_attempt()
            .map(|a| a.answers.as_slice())
            .unwrap_or(&[])
    }
}
