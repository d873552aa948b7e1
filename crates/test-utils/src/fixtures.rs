//! Ready-made catalogs and id helpers shared by the integration tests.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use wayfinder::api::StepSubmission;
use wayfinder::catalog::Catalog;
use wayfinder::engagement::Answer;
use wayfinder::types::{CollectionId, QuestionId, StepId, WorkflowId};

use crate::builders::{
    CatalogBuilder, CollectionBuilder, QuestionBuilder, StepBuilder, WorkflowBuilder,
    answer_equals, step_finished,
};

pub fn collection_id(code: &str) -> CollectionId {
    CollectionId::derive(&format!("{code}/1"))
}

pub fn workflow_id(code: &str) -> WorkflowId {
    WorkflowId::derive(&format!("{code}/1"))
}

pub fn step_id(workflow: &str, step: &str) -> StepId {
    StepId::derive(&format!("{workflow}/1/{step}"))
}

pub fn question_id(workflow: &str, step: &str, question: &str) -> QuestionId {
    QuestionId::derive(&format!("{workflow}/1/{step}/{question}"))
}

/// A submission that finishes `step` with the given `(question, value)` pairs.
pub fn finish_step(
    workflow: &str,
    step: &str,
    answers: &[(&str, Value)],
    at: DateTime<Utc>,
) -> StepSubmission {
    StepSubmission {
        step_id: step_id(workflow, step),
        started: at,
        finished: Some(at),
        answers: Some(
            answers
                .iter()
                .map(|(q, v)| Answer::new(question_id(workflow, step, q), v.clone()))
                .collect(),
        ),
    }
}

/// `pets` survey: `cat_or_dog -> {fav_cat, fav_dog} -> final`.
///
/// `fav_cat` needs the answer "cat", `fav_dog` needs "dog", and `final` is
/// unlocked by finishing either branch.
pub fn diamond_catalog() -> Catalog {
    let pets = WorkflowBuilder::new("pets")
        .step(
            StepBuilder::new("cat_or_dog", 1)
                .question(
                    QuestionBuilder::single_choice("pet", json!(["cat", "dog"]))
                        .required(true)
                        .build(),
                )
                .build(),
        )
        .step(
            StepBuilder::new("fav_cat", 2)
                .question(QuestionBuilder::free_form("breed").required(true).build())
                .build(),
        )
        .step(
            StepBuilder::new("fav_dog", 3)
                .question(QuestionBuilder::free_form("breed").required(true).build())
                .build(),
        )
        .step(StepBuilder::new("final", 4).build())
        .build();

    CatalogBuilder::new()
        .workflow(pets)
        .collection(
            CollectionBuilder::survey("pets-survey")
                .member("pets", 1)
                .group(
                    ("pets", "fav_cat"),
                    vec![(("pets", "cat_or_dog"), answer_equals(json!("cat")))],
                )
                .group(
                    ("pets", "fav_dog"),
                    vec![(("pets", "cat_or_dog"), answer_equals(json!("dog")))],
                )
                .group(("pets", "final"), vec![(("pets", "fav_cat"), step_finished())])
                .group(("pets", "final"), vec![(("pets", "fav_dog"), step_finished())])
                .build(),
        )
        .build()
}

/// Three-workflow activity (`warmup`, `main`, `cooldown`, two steps each).
pub fn activity_catalog(ordered: bool) -> Catalog {
    let mut builder = CatalogBuilder::new();
    for code in ["warmup", "main", "cooldown"] {
        builder = builder.workflow(
            WorkflowBuilder::new(code)
                .plain_step("one")
                .plain_step("two")
                .build(),
        );
    }
    builder
        .collection(
            CollectionBuilder::activity("training")
                .ordered(ordered)
                .member("warmup", 1)
                .member("main", 2)
                .member("cooldown", 3)
                .build(),
        )
        .build()
}
