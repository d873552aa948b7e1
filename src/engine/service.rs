// src/engine/service.rs

//! Read-compute-write operations over a catalog and a store.
//!
//! The service owns no state of its own. Every call reloads what it needs
//! from the store, runs the pure engine and writes the result back; races are
//! settled by the store's uniqueness constraints.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::{StepSubmission, SubmissionResponse};
use crate::catalog::{Catalog, CollectionPlan};
use crate::engagement::{Attempt, Engagement, EngagementDetail, EngagementStore};
use crate::engine::progression::{ProgressionEngine, ProgressionState};
use crate::engine::submission::SubmissionValidator;
use crate::errors::{Result, WayfinderError};
use crate::schema::SchemaDocument;
use crate::types::{CollectionId, EngagementId, QuestionId, UserId};

/// Whether a submission creates the step's detail or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update,
}

pub struct EngagementService<'a, S: EngagementStore> {
    catalog: &'a Catalog,
    store: &'a S,
}

impl<'a, S: EngagementStore> EngagementService<'a, S> {
    pub fn new(catalog: &'a Catalog, store: &'a S) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Start a new engagement of `user` with a collection.
    pub fn begin(
        &self,
        user: &UserId,
        collection: &CollectionId,
        started: DateTime<Utc>,
    ) -> Result<Engagement> {
        let plan = self
            .catalog
            .plan(collection)
            .ok_or_else(|| WayfinderError::NotFound(format!("collection {collection}")))?;

        let engagement = Engagement::new(plan.collection().id, user.clone(), started);
        self.store.create_engagement(engagement)
    }

    pub fn state(&self, user: &UserId, engagement: &EngagementId) -> Result<ProgressionState> {
        let (engagement, plan) = self.owned(user, engagement)?;
        ProgressionEngine::new(plan, self.store).compute(&engagement)
    }

    pub fn submit(
        &self,
        user: &UserId,
        engagement: &EngagementId,
        submission: StepSubmission,
        mode: SubmitMode,
    ) -> Result<SubmissionResponse> {
        let (engagement, plan) = self.owned(user, engagement)?;
        if engagement.is_finished() {
            return Err(WayfinderError::InvalidSubmission(format!(
                "engagement {} is already finished",
                engagement.id
            )));
        }

        let engine = ProgressionEngine::new(plan, self.store);
        let state = engine.compute(&engagement)?;

        let finishing = submission.is_finishing();
        let scored = SubmissionValidator::new(self.catalog, plan, self.store).validate_and_score(
            &engagement,
            &state,
            &submission.step_id,
            submission.answers,
            finishing,
        )?;

        let existing = self.store.detail(&engagement.id, &submission.step_id)?;
        let mut detail = match (mode, existing) {
            (SubmitMode::Create, Some(_)) => {
                return Err(WayfinderError::Conflict(format!(
                    "step {} already has a detail in engagement {}",
                    submission.step_id, engagement.id
                )));
            }
            (SubmitMode::Update, None) => {
                return Err(WayfinderError::NotFound(format!(
                    "no detail for step {} in engagement {}",
                    submission.step_id, engagement.id
                )));
            }
            (SubmitMode::Create, None) => {
                EngagementDetail::new(engagement.id, submission.step_id, submission.started)
            }
            (SubmitMode::Update, Some(detail)) => detail,
        };

        if let Some(answers) = scored.answers {
            detail.responses.push(Attempt {
                submitted_at: submission.finished.unwrap_or_else(Utc::now),
                answers,
            });
        }
        if submission.finished.is_some() {
            detail.finished = submission.finished;
        }

        let detail = match mode {
            SubmitMode::Create => self.store.insert_detail(detail)?,
            SubmitMode::Update => self.store.update_detail(detail)?,
        };

        let state = engine.compute(&engagement)?;
        debug!(
            engagement = %engagement.id,
            step = %detail.step_id,
            finished = detail.is_finished(),
            proceed = scored.may_proceed,
            "submission stored"
        );

        Ok(SubmissionResponse {
            detail,
            state: state.into(),
            proceed: scored.scored.then_some(scored.may_proceed),
        })
    }

    /// Finish an engagement; unfinished step details are discarded.
    pub fn finish(
        &self,
        user: &UserId,
        engagement: &EngagementId,
        finished: DateTime<Utc>,
    ) -> Result<Engagement> {
        let (engagement, _) = self.owned(user, engagement)?;
        if engagement.is_finished() {
            return Err(WayfinderError::InvalidSubmission(format!(
                "engagement {} is already finished",
                engagement.id
            )));
        }
        let engagement = self.store.finish_engagement(&engagement.id, finished)?;
        info!(engagement = %engagement.id, user = %user, "engagement finished");
        Ok(engagement)
    }

    /// Synthesized answer schema of a question.
    pub fn schema_for(&self, question: &QuestionId) -> Result<SchemaDocument> {
        let question = self
            .catalog
            .question(question)
            .ok_or_else(|| WayfinderError::NotFound(format!("question {question}")))?;
        Ok(question.answer_schema().clone())
    }

    /// Load an engagement owned by `user`. Someone else's engagement is
    /// reported exactly like a missing one.
    fn owned(&self, user: &UserId, id: &EngagementId) -> Result<(Engagement, &'a CollectionPlan)> {
        let engagement = self
            .store
            .engagement(id)?
            .filter(|e| &e.user_id == user)
            .ok_or_else(|| WayfinderError::NotFound(format!("engagement {id}")))?;

        let plan = self.catalog.plan(&engagement.collection_id).ok_or_else(|| {
            WayfinderError::NotFound(format!("collection {}", engagement.collection_id))
        })?;
        Ok((engagement, plan))
    }
}
