// src/api.rs

//! Wire shapes for callers that expose the engine over a transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::{Answer, EngagementDetail};
use crate::engine::progression::ProgressionState;
use crate::types::{StepId, WorkflowId};

/// Flat JSON rendering of a [`ProgressionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionStateView {
    pub next_step_id: Option<StepId>,
    pub next_workflow_id: Option<WorkflowId>,
    pub prev_step_id: Option<StepId>,
    pub prev_workflow_id: Option<WorkflowId>,
    pub steps_completed_in_collection: usize,
    pub steps_in_collection: usize,
    pub steps_completed_in_workflow: usize,
    pub steps_in_workflow: usize,
    pub previously_completed_workflows: Vec<WorkflowId>,
}

impl From<&ProgressionState> for ProgressionStateView {
    fn from(state: &ProgressionState) -> Self {
        Self {
            next_step_id: state.next.map(|p| p.step),
            next_workflow_id: state.next.map(|p| p.workflow),
            prev_step_id: state.previous.map(|p| p.step),
            prev_workflow_id: state.previous.map(|p| p.workflow),
            steps_completed_in_collection: state.progress.steps_completed_in_collection,
            steps_in_collection: state.progress.steps_in_collection,
            steps_completed_in_workflow: state.progress.steps_completed_in_workflow,
            steps_in_workflow: state.progress.steps_in_workflow,
            previously_completed_workflows: state.previously_completed_workflows.clone(),
        }
    }
}

impl From<ProgressionState> for ProgressionStateView {
    fn from(state: ProgressionState) -> Self {
        Self::from(&state)
    }
}

/// Body of a step submission. Setting `finished` asks for the step to be
/// completed, which triggers scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSubmission {
    pub step_id: StepId,
    pub started: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
}

impl StepSubmission {
    pub fn is_finishing(&self) -> bool {
        self.finished.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResponse {
    pub detail: EngagementDetail,
    pub state: ProgressionStateView,
    /// Present only when the submission was scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proceed: Option<bool>,
}
