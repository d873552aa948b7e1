// src/engagement/store.rs

//! Storage seams.
//!
//! The engine only ever sees [`HistoryLookup`]; writes go through
//! [`EngagementStore`] from the service layer. Uniqueness is the store's job:
//! at most one unfinished engagement per (user, collection) and one detail per
//! (engagement, step). A violated constraint is reported as
//! [`WayfinderError::Conflict`](crate::errors::WayfinderError::Conflict) and
//! never retried.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::engagement::{Engagement, EngagementDetail};
use crate::errors::Result;
use crate::types::{EngagementId, StepId, UserId};

/// Read-only view of completed work.
pub trait HistoryLookup {
    /// The *finished* detail for (engagement, step), if there is one.
    fn finished_detail(
        &self,
        engagement: &EngagementId,
        step: &StepId,
    ) -> Result<Option<EngagementDetail>>;

    /// Steps with a finished detail in this engagement.
    fn finished_steps(&self, engagement: &EngagementId) -> Result<HashSet<StepId>>;

    /// Whether `user` has a finished detail for `step` in any engagement.
    fn user_finished_step(&self, user: &UserId, step: &StepId) -> Result<bool>;

    /// Steps with a detail in this engagement, finished or not.
    fn started_steps(&self, engagement: &EngagementId) -> Result<HashSet<StepId>>;

    /// Number of details (finished or not) recorded in this engagement.
    fn detail_count(&self, engagement: &EngagementId) -> Result<usize>;
}

/// Engagement persistence.
pub trait EngagementStore: HistoryLookup {
    fn engagement(&self, id: &EngagementId) -> Result<Option<Engagement>>;

    /// Insert a new engagement. Conflict if the user already has an unfinished
    /// engagement for the same collection.
    fn create_engagement(&self, engagement: Engagement) -> Result<Engagement>;

    /// Mark an engagement finished and delete its unfinished details.
    fn finish_engagement(&self, id: &EngagementId, finished: DateTime<Utc>) -> Result<Engagement>;

    fn detail(&self, engagement: &EngagementId, step: &StepId) -> Result<Option<EngagementDetail>>;

    /// Insert a new detail. Conflict if one exists for (engagement, step).
    fn insert_detail(&self, detail: EngagementDetail) -> Result<EngagementDetail>;

    /// Replace an existing detail. Not-found if there is none.
    fn update_detail(&self, detail: EngagementDetail) -> Result<EngagementDetail>;
}
