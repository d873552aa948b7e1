// src/catalog/plan.rs

//! Per-collection navigation plan: the global step ordering plus dependency
//! groups, resolved once when the catalog is validated.
//!
//! Steps are totally ordered by (membership order, step order). Both keys are
//! unique in their scope, so every step gets a distinct `position`.

use std::collections::HashMap;
use std::ops::Range;

use crate::catalog::model::{Collection, DependencyGroup, Step, Workflow};
use crate::types::{StepId, WorkflowId};

/// A step as seen from one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStep {
    pub id: StepId,
    pub workflow: WorkflowId,
    /// Step `order` within its workflow.
    pub order: u32,
    /// Index in the collection's global ordering.
    pub position: usize,
}

/// A member workflow and the slice of global positions its steps occupy.
#[derive(Debug, Clone)]
pub struct PlannedWorkflow {
    pub id: WorkflowId,
    /// Membership `order` within the collection.
    pub order: u32,
    pub(crate) span: Range<usize>,
}

impl PlannedWorkflow {
    pub fn step_count(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CollectionPlan {
    collection: Collection,
    workflows: Vec<PlannedWorkflow>,
    steps: Vec<PlannedStep>,
    positions: HashMap<StepId, usize>,
    workflow_index: HashMap<WorkflowId, usize>,
    groups: HashMap<StepId, Vec<DependencyGroup>>,
}

impl CollectionPlan {
    /// Build the global ordering from `(membership order, workflow)` pairs.
    ///
    /// Assumes membership orders are unique and each workflow's `steps` are
    /// already sorted by step order (both enforced by `catalog::validate`).
    pub(crate) fn new(
        collection: Collection,
        mut members: Vec<(u32, &Workflow)>,
        catalog_steps: &HashMap<StepId, Step>,
    ) -> Self {
        members.sort_by_key(|(order, _)| *order);

        let mut workflows = Vec::with_capacity(members.len());
        let mut steps = Vec::new();
        let mut positions = HashMap::new();
        let mut workflow_index = HashMap::new();

        for (order, workflow) in members {
            let start = steps.len();
            for step_id in workflow.steps.iter() {
                let position = steps.len();
                positions.insert(*step_id, position);
                steps.push(PlannedStep {
                    id: *step_id,
                    workflow: workflow.id,
                    order: catalog_steps.get(step_id).map(|s| s.order).unwrap_or_default(),
                    position,
                });
            }
            workflow_index.insert(workflow.id, workflows.len());
            workflows.push(PlannedWorkflow {
                id: workflow.id,
                order,
                span: start..steps.len(),
            });
        }

        Self {
            collection,
            workflows,
            steps,
            positions,
            workflow_index,
            groups: HashMap::new(),
        }
    }

    pub(crate) fn add_group(&mut self, group: DependencyGroup) {
        self.groups.entry(group.step).or_default().push(group);
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// All steps in global order.
    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    /// Member workflows in membership order.
    pub fn workflows(&self) -> &[PlannedWorkflow] {
        &self.workflows
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn contains_step(&self, step: &StepId) -> bool {
        self.positions.contains_key(step)
    }

    pub fn position_of(&self, step: &StepId) -> Option<usize> {
        self.positions.get(step).copied()
    }

    pub fn planned_step(&self, step: &StepId) -> Option<&PlannedStep> {
        self.position_of(step).map(|p| &self.steps[p])
    }

    pub fn first_step(&self) -> Option<&PlannedStep> {
        self.steps.first()
    }

    pub fn workflow(&self, id: &WorkflowId) -> Option<&PlannedWorkflow> {
        self.workflow_index.get(id).map(|i| &self.workflows[*i])
    }

    /// Steps of one member workflow, in step order.
    pub fn steps_of(&self, workflow: &PlannedWorkflow) -> &[PlannedStep] {
        &self.steps[workflow.span.clone()]
    }

    /// First step of a member workflow, if it has any.
    pub fn first_step_of(&self, workflow: &PlannedWorkflow) -> Option<&PlannedStep> {
        self.steps_of(workflow).first()
    }

    /// Steps strictly after `position` in global order.
    pub fn steps_after(&self, position: usize) -> &[PlannedStep] {
        let start = (position + 1).min(self.steps.len());
        &self.steps[start..]
    }

    /// Dependency groups attached to `step` in this collection.
    pub fn dependency_groups(&self, step: &StepId) -> &[DependencyGroup] {
        self.groups.get(step).map(|g| g.as_slice()).unwrap_or(&[])
    }
}
