// src/engine/progression.rs

//! Where an engagement stands: the step to resume at, the step last
//! completed, progress counters and the workflows already behind the user.
//!
//! Everything here is a pure function of the collection plan and the history
//! lookup; nothing is cached between calls.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{CollectionPlan, PlannedStep, PlannedWorkflow};
use crate::engagement::{Engagement, HistoryLookup};
use crate::engine::dependency::DependencyEvaluator;
use crate::errors::Result;
use crate::types::{Category, StepId, WorkflowId};

/// A step together with the workflow that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepPointer {
    pub step: StepId,
    pub workflow: WorkflowId,
}

impl From<&PlannedStep> for StepPointer {
    fn from(step: &PlannedStep) -> Self {
        Self {
            step: step.id,
            workflow: step.workflow,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub steps_completed_in_collection: usize,
    pub steps_in_collection: usize,
    /// Both workflow counters are 0 when there is no current workflow.
    pub steps_completed_in_workflow: usize,
    pub steps_in_workflow: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressionState {
    pub next: Option<StepPointer>,
    pub previous: Option<StepPointer>,
    pub progress: Progress,
    /// In membership order.
    pub previously_completed_workflows: Vec<WorkflowId>,
}

impl ProgressionState {
    /// The workflow the counters refer to: that of `next`, else of `previous`.
    pub fn current_workflow(&self) -> Option<WorkflowId> {
        self.next.or(self.previous).map(|p| p.workflow)
    }
}

pub struct ProgressionEngine<'a, H: HistoryLookup + ?Sized> {
    plan: &'a CollectionPlan,
    history: &'a H,
}

impl<'a, H: HistoryLookup + ?Sized> ProgressionEngine<'a, H> {
    pub fn new(plan: &'a CollectionPlan, history: &'a H) -> Self {
        Self { plan, history }
    }

    pub fn compute(&self, engagement: &Engagement) -> Result<ProgressionState> {
        let finished: HashSet<StepId> = self
            .history
            .finished_steps(&engagement.id)?
            .into_iter()
            .filter(|s| self.plan.contains_step(s))
            .collect();

        let previous = self.previous_step(&finished);
        let next = self.next_step(engagement, &finished, previous)?;

        let state = ProgressionState {
            next: next.map(StepPointer::from),
            previous: previous.map(StepPointer::from),
            progress: Progress::default(),
            previously_completed_workflows: Vec::new(),
        };
        let current = state.current_workflow().and_then(|id| self.plan.workflow(&id));

        let progress = self.progress(&finished, current);
        let previously_completed_workflows = self.completed_workflows(engagement, current)?;

        debug!(
            engagement = %engagement.id,
            next = ?state.next.map(|p| p.step),
            previous = ?state.previous.map(|p| p.step),
            completed = progress.steps_completed_in_collection,
            total = progress.steps_in_collection,
            "computed progression state"
        );

        Ok(ProgressionState {
            progress,
            previously_completed_workflows,
            ..state
        })
    }

    /// Greatest-position finished step; for unordered activities, restricted
    /// to the workflow currently in progress.
    fn previous_step(&self, finished: &HashSet<StepId>) -> Option<&'a PlannedStep> {
        if self.plan.collection().is_free_roaming() {
            let workflow = self.workflow_in_progress(finished)?;
            return self
                .plan
                .steps_of(workflow)
                .iter()
                .rev()
                .find(|s| finished.contains(&s.id));
        }

        self.plan
            .steps()
            .iter()
            .rev()
            .find(|s| finished.contains(&s.id))
    }

    /// Lowest-order member workflow with some, but not all, steps finished.
    pub(crate) fn workflow_in_progress(&self, finished: &HashSet<StepId>) -> Option<&'a PlannedWorkflow> {
        self.plan.workflows().iter().find(|w| {
            let done = self
                .plan
                .steps_of(w)
                .iter()
                .filter(|s| finished.contains(&s.id))
                .count();
            done > 0 && done < w.step_count()
        })
    }

    fn next_step(
        &self,
        engagement: &Engagement,
        finished: &HashSet<StepId>,
        previous: Option<&'a PlannedStep>,
    ) -> Result<Option<&'a PlannedStep>> {
        if finished.is_empty() {
            return Ok(self.plan.first_step());
        }

        if self.plan.collection().is_free_roaming() {
            let Some(previous) = previous else {
                return Ok(None);
            };
            let next = self
                .plan
                .workflow(&previous.workflow)
                .and_then(|w| {
                    self.plan
                        .steps_of(w)
                        .iter()
                        .find(|s| !finished.contains(&s.id))
                });
            return Ok(next);
        }

        let Some(previous) = previous else {
            return Ok(self.plan.first_step());
        };

        let evaluator = DependencyEvaluator::new(self.plan, self.history);
        for candidate in self.plan.steps_after(previous.position) {
            if evaluator.is_unlocked(&engagement.id, &candidate.id)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn progress(&self, finished: &HashSet<StepId>, current: Option<&PlannedWorkflow>) -> Progress {
        let mut progress = Progress {
            steps_completed_in_collection: finished.len(),
            steps_in_collection: self.plan.step_count(),
            ..Progress::default()
        };

        if let Some(workflow) = current {
            progress.steps_in_workflow = workflow.step_count();
            progress.steps_completed_in_workflow = self
                .plan
                .steps_of(workflow)
                .iter()
                .filter(|s| finished.contains(&s.id))
                .count();
        }

        progress
    }

    fn completed_workflows(
        &self,
        engagement: &Engagement,
        current: Option<&PlannedWorkflow>,
    ) -> Result<Vec<WorkflowId>> {
        match self.plan.collection().category {
            Category::Survey => {
                let Some(current) = current else {
                    return Ok(Vec::new());
                };
                Ok(self
                    .plan
                    .workflows()
                    .iter()
                    .filter(|w| w.order < current.order)
                    .map(|w| w.id)
                    .collect())
            }
            Category::Activity => {
                let mut done = Vec::new();
                for workflow in self.plan.workflows() {
                    if workflow.is_empty() {
                        continue;
                    }
                    let mut all = true;
                    for step in self.plan.steps_of(workflow) {
                        if !self.history.user_finished_step(&engagement.user_id, &step.id)? {
                            all = false;
                            break;
                        }
                    }
                    if all {
                        done.push(workflow.id);
                    }
                }
                Ok(done)
            }
        }
    }
}
