// src/engine/submission.rs

//! Submission legality and scoring.
//!
//! Legality is decided against the current [`ProgressionState`]; scoring only
//! happens when the submission finishes the step. An answer that fails its
//! schema is kept and marked `is_valid = false`; it never fails the request.

use std::collections::HashSet;

use serde_json::json;
use tracing::{debug, warn};

use crate::catalog::{Catalog, CollectionPlan, Step};
use crate::engagement::{Answer, Engagement, HistoryLookup};
use crate::engine::progression::{ProgressionEngine, ProgressionState, StepPointer};
use crate::errors::{Result, WayfinderError};
use crate::types::{Category, QuestionId, StepId};

/// Outcome of validating one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    /// Answers to persist, with `question_identifier` filled in and, when
    /// scored, `is_valid` set.
    pub answers: Option<Vec<Answer>>,
    /// Whether the answers were checked against their schemas.
    pub scored: bool,
    /// AND of every `is_valid`; true when nothing was scored.
    pub may_proceed: bool,
}

pub struct SubmissionValidator<'a, H: HistoryLookup + ?Sized> {
    catalog: &'a Catalog,
    plan: &'a CollectionPlan,
    history: &'a H,
}

impl<'a, H: HistoryLookup + ?Sized> SubmissionValidator<'a, H> {
    pub fn new(catalog: &'a Catalog, plan: &'a CollectionPlan, history: &'a H) -> Self {
        Self {
            catalog,
            plan,
            history,
        }
    }

    /// Check legality, then score the answers if `finishing`.
    pub fn validate_and_score(
        &self,
        engagement: &Engagement,
        state: &ProgressionState,
        step: &StepId,
        answers: Option<Vec<Answer>>,
        finishing: bool,
    ) -> Result<Scored> {
        self.check_legal(engagement, state, step)?;

        let step = self
            .catalog
            .step(step)
            .ok_or_else(|| WayfinderError::NotFound(format!("step {step}")))?;

        let answers = answers
            .map(|answers| self.identify(step, answers))
            .transpose()?;

        if !finishing {
            return Ok(Scored {
                answers,
                scored: false,
                may_proceed: true,
            });
        }

        self.check_required(step, answers.as_deref())?;

        let Some(mut answers) = answers else {
            return Ok(Scored {
                answers: None,
                scored: true,
                may_proceed: true,
            });
        };

        let mut may_proceed = true;
        for answer in answers.iter_mut() {
            let Some(question) = step.question(&answer.question_id) else {
                continue;
            };
            let envelope = json!({
                "question_id": answer.question_id,
                "value": answer.value,
            });
            let valid = question.accepts(&envelope);
            if !valid {
                debug!(question = %question.code, value = %answer.value, "answer failed its schema");
            }
            answer.is_valid = Some(valid);
            may_proceed &= valid;
        }

        Ok(Scored {
            answers: Some(answers),
            scored: true,
            may_proceed,
        })
    }

    /// A submission may target `next` or `previous`, plus the activity
    /// entry points.
    pub fn check_legal(
        &self,
        engagement: &Engagement,
        state: &ProgressionState,
        step: &StepId,
    ) -> Result<()> {
        let Some(planned) = self.plan.planned_step(step) else {
            warn!(engagement = %engagement.id, %step, "step is not part of the collection");
            return Err(WayfinderError::Navigation(format!(
                "step {step} is not part of collection {}",
                self.plan.collection().code
            )));
        };

        let is_pointer = |p: Option<StepPointer>| p.is_some_and(|p| &p.step == step);
        if is_pointer(state.next) || is_pointer(state.previous) {
            return Ok(());
        }

        let collection = self.plan.collection();
        let is_workflow_entry = self
            .plan
            .workflow(&planned.workflow)
            .and_then(|w| self.plan.first_step_of(w))
            .is_some_and(|first| &first.id == step);

        if collection.category == Category::Activity && is_workflow_entry {
            // Entry is open until work exists on some other step, so a
            // started-only entry detail can still be finished.
            let started = self.history.started_steps(&engagement.id)?;
            if started.iter().all(|s| s == step) {
                return Ok(());
            }

            if collection.is_free_roaming() {
                let finished: HashSet<StepId> = self.history.finished_steps(&engagement.id)?;
                let engine = ProgressionEngine::new(self.plan, self.history);
                let in_progress = engine.workflow_in_progress(&finished).is_some();
                let workflow_done = self
                    .plan
                    .workflow(&planned.workflow)
                    .is_some_and(|w| self.plan.steps_of(w).iter().all(|s| finished.contains(&s.id)));
                if !in_progress && !workflow_done {
                    return Ok(());
                }
            }
        }

        warn!(
            engagement = %engagement.id,
            %step,
            next = ?state.next.map(|p| p.step),
            previous = ?state.previous.map(|p| p.step),
            "submission targets an unreachable step"
        );
        Err(WayfinderError::Navigation(format!(
            "step {step} is neither the next nor the previous step of engagement {}",
            engagement.id
        )))
    }

    /// Reject answers for foreign questions and fill in question codes.
    fn identify(&self, step: &Step, mut answers: Vec<Answer>) -> Result<Vec<Answer>> {
        for answer in answers.iter_mut() {
            let question = step.question(&answer.question_id).ok_or_else(|| {
                WayfinderError::InvalidSubmission(format!(
                    "question {} does not belong to step {}",
                    answer.question_id, step.code
                ))
            })?;
            answer.question_identifier = question.code.clone();
            answer.is_valid = None;
        }
        Ok(answers)
    }

    fn check_required(&self, step: &Step, answers: Option<&[Answer]>) -> Result<()> {
        if step.required_questions().next().is_none() {
            return Ok(());
        }

        let Some(answers) = answers else {
            return Err(WayfinderError::InvalidSubmission(format!(
                "step {} has required questions but no answers were submitted",
                step.code
            )));
        };

        let answered: HashSet<QuestionId> = answers.iter().map(|a| a.question_id).collect();
        let missing: Vec<&str> = step
            .required_questions()
            .filter(|q| !answered.contains(&q.id))
            .map(|q| q.code.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(WayfinderError::InvalidSubmission(format!(
                "missing answers for required questions of step {}: {}",
                step.code,
                missing.join(", ")
            )));
        }
        Ok(())
    }
}
