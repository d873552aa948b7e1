// src/engine/dependency.rs

//! Step unlocking.
//!
//! A step with no dependency groups is always unlocked. Otherwise the groups
//! are OR-ed and the details inside one group are AND-ed. A detail holds when
//! the prerequisite step has a finished detail in the same engagement and the
//! answers of its last attempt satisfy the detail's `required_response`.

use serde_json::Value;
use tracing::debug;

use crate::catalog::{CollectionPlan, DependencyDetail, DependencyGroup};
use crate::engagement::{Answer, HistoryLookup};
use crate::errors::Result;
use crate::types::{EngagementId, StepId};

/// Read-only evaluator over one collection plan and a history lookup.
#[derive(Debug)]
pub struct DependencyEvaluator<'a, H: HistoryLookup + ?Sized> {
    plan: &'a CollectionPlan,
    history: &'a H,
}

impl<'a, H: HistoryLookup + ?Sized> DependencyEvaluator<'a, H> {
    pub fn new(plan: &'a CollectionPlan, history: &'a H) -> Self {
        Self { plan, history }
    }

    /// Whether `step` may be entered in `engagement`.
    pub fn is_unlocked(&self, engagement: &EngagementId, step: &StepId) -> Result<bool> {
        let groups = self.plan.dependency_groups(step);
        if groups.is_empty() {
            return Ok(true);
        }

        for (index, group) in groups.iter().enumerate() {
            if self.group_satisfied(engagement, group)? {
                debug!(%engagement, %step, group = index, "step unlocked");
                return Ok(true);
            }
        }

        debug!(%engagement, %step, groups = groups.len(), "step locked");
        Ok(false)
    }

    fn group_satisfied(&self, engagement: &EngagementId, group: &DependencyGroup) -> Result<bool> {
        for detail in &group.details {
            if !self.detail_satisfied(engagement, detail)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn detail_satisfied(&self, engagement: &EngagementId, detail: &DependencyDetail) -> Result<bool> {
        let Some(prior) = self.history.finished_detail(engagement, &detail.prerequisite)? else {
            return Ok(false);
        };
        answers_satisfy(detail, prior.last_answers())
    }
}

/// Match an answer list against a detail's `required_response`.
///
/// A document whose top-level type is `"array"` is checked against the whole
/// list; anything else is satisfied by a single matching answer.
pub fn answers_satisfy(detail: &DependencyDetail, answers: &[Answer]) -> Result<bool> {
    let schema = detail.matcher();

    if detail.required_response.declared_type() == Some("array") {
        let list = serde_json::to_value(answers)?;
        return Ok(schema.is_valid(&list));
    }

    for answer in answers {
        let instance: Value = serde_json::to_value(answer)?;
        if schema.is_valid(&instance) {
            return Ok(true);
        }
    }
    Ok(false)
}
