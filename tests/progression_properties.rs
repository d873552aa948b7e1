mod common;

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Value, json};
use wayfinder::api::StepSubmission;
use wayfinder::catalog::Catalog;
use wayfinder::engagement::{Engagement, HistoryLookup, MemoryStore};
use wayfinder::engine::{DependencyEvaluator, EngagementService, ProgressionState, SubmitMode};
use wayfinder::types::StepId;
use wayfinder_test_utils::builders::{
    CatalogBuilder, CollectionBuilder, QuestionBuilder, StepBuilder, WorkflowBuilder,
    answer_equals,
};

use common::{alice, at, collection_id, question_id, step_id};

const WORKFLOW: &str = "flow";

// Strategy for a single-workflow survey. Every step asks "yes" or "no"; a
// step may depend on earlier steps only, which keeps the graph acyclic.
fn survey_strategy(max_steps: usize) -> impl Strategy<Value = Catalog> {
    (1..=max_steps).prop_flat_map(|num_steps| {
        let deps = proptest::collection::vec(
            proptest::collection::vec((any::<usize>(), any::<bool>()), 0..3),
            num_steps,
        );
        deps.prop_map(move |raw_deps| {
            let mut workflow = WorkflowBuilder::new(WORKFLOW);
            for i in 0..num_steps {
                workflow = workflow.step(
                    StepBuilder::new(&format!("s{i}"), i as u32 + 1)
                        .question(
                            QuestionBuilder::single_choice("ok", json!(["yes", "no"]))
                                .required(true)
                                .build(),
                        )
                        .build(),
                );
            }

            let mut collection = CollectionBuilder::survey("prop").member(WORKFLOW, 1);
            for (i, potential) in raw_deps.into_iter().enumerate() {
                if i == 0 {
                    continue;
                }
                let mut seen = HashSet::new();
                let details: Vec<_> = potential
                    .into_iter()
                    .map(|(dep, yes)| (dep % i, yes))
                    .filter(|d| seen.insert(*d))
                    .collect();
                if details.is_empty() {
                    continue;
                }
                let step = format!("s{i}");
                let details = details
                    .into_iter()
                    .map(|(dep, yes)| {
                        let answer = if yes { "yes" } else { "no" };
                        (format!("s{dep}"), answer_equals(json!(answer)))
                    })
                    .collect::<Vec<_>>();
                collection = collection.group(
                    (WORKFLOW, step.as_str()),
                    details
                        .iter()
                        .map(|(prereq, response)| ((WORKFLOW, prereq.as_str()), response.clone()))
                        .collect(),
                );
            }

            CatalogBuilder::new()
                .workflow(workflow.build())
                .collection(collection.build())
                .build()
        })
    })
}

fn walk(
    catalog: &Catalog,
    store: &MemoryStore,
    engagement: &Engagement,
    answers: &[bool],
) -> Vec<ProgressionState> {
    let service = EngagementService::new(catalog, store);
    let mut states = vec![service.state(&alice(), &engagement.id).unwrap()];

    for (minute, yes) in answers.iter().enumerate() {
        let Some(next) = states.last().and_then(|s| s.next) else {
            break;
        };
        let step = catalog.step(&next.step).unwrap();
        let value: Value = json!(if *yes { "yes" } else { "no" });
        let submission = StepSubmission {
            step_id: next.step,
            started: at(minute as i64),
            finished: Some(at(minute as i64)),
            answers: Some(vec![wayfinder::engagement::Answer::new(
                question_id(WORKFLOW, &step.code, "ok"),
                value,
            )]),
        };
        service
            .submit(&alice(), &engagement.id, submission, SubmitMode::Create)
            .unwrap();
        states.push(service.state(&alice(), &engagement.id).unwrap());
    }
    states
}

proptest! {
    #[test]
    fn progress_counters_stay_in_bounds(
        catalog in survey_strategy(8),
        answers in proptest::collection::vec(any::<bool>(), 0..10),
    ) {
        let store = MemoryStore::new();
        let engagement = common::begin(&catalog, &store, &alice(), "prop", at(0));

        for state in walk(&catalog, &store, &engagement, &answers) {
            let p = state.progress;
            prop_assert!(p.steps_completed_in_collection <= p.steps_in_collection);
            prop_assert!(p.steps_completed_in_workflow <= p.steps_in_workflow);
            prop_assert!(p.steps_in_workflow <= p.steps_in_collection);
            if let (Some(next), Some(prev)) = (state.next, state.previous) {
                let plan = catalog.plan(&collection_id("prop")).unwrap();
                prop_assert!(plan.position_of(&next.step) > plan.position_of(&prev.step));
            }
        }
    }

    #[test]
    fn unlocking_is_stable_across_evaluations(
        catalog in survey_strategy(8),
        answers in proptest::collection::vec(any::<bool>(), 0..10),
    ) {
        let store = MemoryStore::new();
        let engagement = common::begin(&catalog, &store, &alice(), "prop", at(0));
        walk(&catalog, &store, &engagement, &answers);

        let plan = catalog.plan(&collection_id("prop")).unwrap();
        let evaluator = DependencyEvaluator::new(plan, &store);
        for step in plan.steps() {
            let first = evaluator.is_unlocked(&engagement.id, &step.id).unwrap();
            let second = evaluator.is_unlocked(&engagement.id, &step.id).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn surveys_without_dependencies_end_fully_completed(
        num_steps in 1..8usize,
        answers in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let mut workflow = WorkflowBuilder::new(WORKFLOW);
        for i in 0..num_steps {
            workflow = workflow.step(
                StepBuilder::new(&format!("s{i}"), i as u32 + 1)
                    .question(
                        QuestionBuilder::single_choice("ok", json!(["yes", "no"]))
                            .required(true)
                            .build(),
                    )
                    .build(),
            );
        }
        let catalog = CatalogBuilder::new()
            .workflow(workflow.build())
            .collection(CollectionBuilder::survey("prop").member(WORKFLOW, 1).build())
            .build();
        let store = MemoryStore::new();
        let engagement = common::begin(&catalog, &store, &alice(), "prop", at(0));

        let states = walk(&catalog, &store, &engagement, &answers);
        let last = states.last().unwrap();
        prop_assert!(last.next.is_none());
        prop_assert_eq!(
            last.progress.steps_completed_in_collection,
            last.progress.steps_in_collection
        );

        let finished: HashSet<StepId> = store.finished_steps(&engagement.id).unwrap();
        prop_assert_eq!(finished.len(), num_steps);
        prop_assert!(finished.contains(&step_id(WORKFLOW, "s0")));
    }
}
