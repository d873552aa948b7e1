mod common;

use std::fs;

use serde_json::json;
use tempfile::tempdir;
use wayfinder::catalog::{Catalog, load_and_validate, load_from_path, load_from_str};
use wayfinder::errors::{ErrorKind, WayfinderError};
use wayfinder::types::{Category, MultiSelectPolicy, QuestionKind, StepId};
use wayfinder_test_utils::builders::{
    CatalogBuilder, CollectionBuilder, StepBuilder, WorkflowBuilder, answer_equals,
};

const PETS: &str = r#"
[config]
multi_select_policy = "set_equality"

[[workflows]]
code = "pets"

  [[workflows.steps]]
  code = "fav_cat"
  order = 2

  [[workflows.steps]]
  code = "cat_or_dog"
  order = 1

    [[workflows.steps.questions]]
    code = "pet"
    kind = "single_choice"
    required = true
    specification = { inputOptions = ["cat", "dog"] }

[[workflows]]
code = "food"

  [[workflows.steps]]
  code = "menu"
  order = 1

    [[workflows.steps.questions]]
    code = "dishes"
    kind = "multiple_choice"
    specification = { meta = { inputRequired = false }, inputOptions = ["fish", "kibble"] }

[[collections]]
code = "pets-survey"
category = "survey"
ordered = true

  [[collections.members]]
  workflow = "food"
  order = 2

  [[collections.members]]
  workflow = "pets"
  order = 1

  [[collections.dependency_groups]]
  step = { workflow = "pets", step = "fav_cat" }

    [[collections.dependency_groups.details]]
    prerequisite = { workflow = "pets", step = "cat_or_dog" }
    required_response = { type = "object", properties = { value = { const = "cat" } }, required = ["value"] }
"#;

fn field_of(err: &WayfinderError) -> &str {
    match err {
        WayfinderError::FieldError { field, .. } => field,
        other => panic!("expected a field error, got {other:?}"),
    }
}

#[test]
fn load_pets_catalog_from_file() {
    common::init_tracing();
    let dir = tempdir().unwrap();
    let path = dir.path().join("Wayfinder.toml");
    fs::write(&path, PETS).unwrap();

    let raw = load_from_path(&path).unwrap();
    assert_eq!(raw.workflows.len(), 2);
    assert_eq!(raw.config.multi_select_policy, MultiSelectPolicy::SetEquality);

    let catalog = load_and_validate(&path).unwrap();
    let plan = catalog.plan(&common::collection_id("pets-survey")).unwrap();
    assert_eq!(plan.collection().category, Category::Survey);

    // Global order follows membership order, then step order.
    let order: Vec<StepId> = plan.steps().iter().map(|s| s.id).collect();
    assert_eq!(
        order,
        vec![
            common::step_id("pets", "cat_or_dog"),
            common::step_id("pets", "fav_cat"),
            common::step_id("food", "menu"),
        ]
    );
    assert_eq!(plan.dependency_groups(&common::step_id("pets", "fav_cat")).len(), 1);

    let question = catalog
        .question(&common::question_id("pets", "cat_or_dog", "pet"))
        .unwrap();
    assert_eq!(question.kind, QuestionKind::SingleChoice);
    assert!(question.required);
}

#[test]
fn ids_are_stable_across_loads() {
    let a: Catalog = Catalog::try_from(load_from_str(PETS).unwrap()).unwrap();
    let b: Catalog = Catalog::try_from(load_from_str(PETS).unwrap()).unwrap();
    let ids = |c: &Catalog| c.plans().map(|p| p.collection().id).collect::<Vec<_>>();
    assert_eq!(ids(&a), ids(&b));
}

#[test]
fn explicit_ids_are_kept() {
    let toml = r#"
[[workflows]]
id = "2f1c9a44-5a55-4a1e-9d2b-7d0e3c3e8a10"
code = "solo"
  [[workflows.steps]]
  id = "9b7c0f0e-7a7e-4c1b-8f0a-0d3e2f1a4b5c"
  code = "only"
  order = 1

[[collections]]
code = "c"
category = "activity"
  [[collections.members]]
  workflow = "solo"
  order = 1
"#;
    let catalog = Catalog::try_from(load_from_str(toml).unwrap()).unwrap();
    let step: StepId = "9b7c0f0e-7a7e-4c1b-8f0a-0d3e2f1a4b5c".parse().unwrap();
    let step = catalog.step(&step).unwrap();
    assert_eq!(step.code, "only");
    assert_eq!(step.workflow_id.to_string(), "2f1c9a44-5a55-4a1e-9d2b-7d0e3c3e8a10");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, WayfinderError::IoError(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let err = load_from_str("[[workflows]\ncode = ").unwrap_err();
    assert!(matches!(err, WayfinderError::TomlError(_)));
}

#[test]
fn catalog_without_collections_is_rejected() {
    let raw = load_from_str("[[workflows]]\ncode = \"w\"\n").unwrap();
    let err = Catalog::try_from(raw).unwrap_err();
    assert!(matches!(err, WayfinderError::CatalogError(_)));
}

fn two_step_workflow() -> wayfinder::catalog::model::WorkflowConfig {
    WorkflowBuilder::new("w").plain_step("a").plain_step("b").build()
}

#[test]
fn forward_pointing_dependency_is_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(two_step_workflow())
        .collection(
            CollectionBuilder::survey("c")
                .member("w", 1)
                .group(("w", "a"), vec![(("w", "b"), json!(true))])
                .build(),
        )
        .build_raw();

    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authoring);
    assert_eq!(
        field_of(&err),
        "collections[0].dependency_groups[0].details[0].prerequisite"
    );
}

#[test]
fn self_dependency_is_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(two_step_workflow())
        .collection(
            CollectionBuilder::survey("c")
                .member("w", 1)
                .group(("w", "b"), vec![(("w", "b"), json!(true))])
                .build(),
        )
        .build_raw();

    let err = Catalog::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("itself"), "{err}");
}

#[test]
fn cross_workflow_cycle_is_rejected() {
    // x/a waits for y/a and y/a waits for x/a: one of the two edges must
    // point forward in the global order.
    let raw = CatalogBuilder::new()
        .workflow(WorkflowBuilder::new("x").plain_step("a").build())
        .workflow(WorkflowBuilder::new("y").plain_step("a").build())
        .collection(
            CollectionBuilder::survey("c")
                .member("x", 1)
                .member("y", 2)
                .group(("y", "a"), vec![(("x", "a"), json!(true))])
                .group(("x", "a"), vec![(("y", "a"), json!(true))])
                .build(),
        )
        .build_raw();

    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(
        field_of(&err),
        "collections[0].dependency_groups[1].details[0].prerequisite"
    );
}

#[test]
fn malformed_required_response_is_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(two_step_workflow())
        .collection(
            CollectionBuilder::survey("c")
                .member("w", 1)
                .group(("w", "b"), vec![(("w", "a"), json!({ "type": "pet" }))])
                .build(),
        )
        .build_raw();

    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(
        field_of(&err),
        "collections[0].dependency_groups[0].details[0].required_response"
    );
}

#[test]
fn dependency_on_non_member_is_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(two_step_workflow())
        .workflow(WorkflowBuilder::new("other").plain_step("a").build())
        .collection(
            CollectionBuilder::survey("c")
                .member("w", 1)
                .group(("w", "b"), vec![(("other", "a"), answer_equals(json!(1)))])
                .build(),
        )
        .build_raw();

    let err = Catalog::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("not a member"), "{err}");
}

#[test]
fn empty_dependency_group_is_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(two_step_workflow())
        .collection(
            CollectionBuilder::survey("c")
                .member("w", 1)
                .group(("w", "b"), vec![])
                .build(),
        )
        .build_raw();

    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(field_of(&err), "collections[0].dependency_groups[0].details");
}

#[test]
fn duplicate_orders_are_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(
            WorkflowBuilder::new("w")
                .step(StepBuilder::new("a", 1).build())
                .step(StepBuilder::new("b", 1).build())
                .build(),
        )
        .collection(CollectionBuilder::survey("c").member("w", 1).build())
        .build_raw();
    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(field_of(&err), "workflows[0].steps[1].order");

    let raw = CatalogBuilder::new()
        .workflow(WorkflowBuilder::new("x").plain_step("a").build())
        .workflow(WorkflowBuilder::new("y").plain_step("a").build())
        .collection(CollectionBuilder::survey("c").member("x", 1).member("y", 1).build())
        .build_raw();
    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(field_of(&err), "collections[0].members[1].order");
}

#[test]
fn unknown_member_workflow_is_rejected() {
    let raw = CatalogBuilder::new()
        .workflow(two_step_workflow())
        .collection(CollectionBuilder::survey("c").member("ghost", 1).build())
        .build_raw();
    let err = Catalog::try_from(raw).unwrap_err();
    assert_eq!(field_of(&err), "collections[0].members[0].workflow");
}

#[test]
fn unsynthesizable_question_is_rejected_at_load_time() {
    let toml = r#"
[config]
max_enumeration = 3

[[workflows]]
code = "w"
  [[workflows.steps]]
  code = "a"
  order = 1
    [[workflows.steps.questions]]
    code = "age"
    kind = "numeric_range"
    specification = { inputOptions = { min = 0, max = 99 } }

[[collections]]
code = "c"
category = "survey"
  [[collections.members]]
  workflow = "w"
  order = 1
"#;
    let err = Catalog::try_from(load_from_str(toml).unwrap()).unwrap_err();
    assert_eq!(field_of(&err), "workflows[0].steps[0].questions[0].specification");
}

#[test]
fn question_type_override_must_accept_its_example() {
    let toml = r#"
[[question_types]]
kind = "free_form"
json_schema = { type = "object", required = ["hint"] }
example_specification = { }

[[workflows]]
code = "w"
  [[workflows.steps]]
  code = "a"
  order = 1

[[collections]]
code = "c"
category = "survey"
  [[collections.members]]
  workflow = "w"
  order = 1
"#;
    let err = Catalog::try_from(load_from_str(toml).unwrap()).unwrap_err();
    assert_eq!(field_of(&err), "question_types[free_form].example_specification");
}

#[test]
fn question_type_override_constrains_specifications() {
    let toml = r#"
[[question_types]]
kind = "free_form"
json_schema = { type = "object", required = ["hint"] }
example_specification = { hint = "say something" }

[[workflows]]
code = "w"
  [[workflows.steps]]
  code = "a"
  order = 1
    [[workflows.steps.questions]]
    code = "comment"
    kind = "free_form"

[[collections]]
code = "c"
category = "survey"
  [[collections.members]]
  workflow = "w"
  order = 1
"#;
    let err = Catalog::try_from(load_from_str(toml).unwrap()).unwrap_err();
    assert_eq!(field_of(&err), "workflows[0].steps[0].questions[0].specification");
}

#[test]
fn demo_catalog_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/Wayfinder.toml");
    let catalog = load_and_validate(path).unwrap();
    assert_eq!(catalog.plans().count(), 2);

    let training = catalog.collection_by_code("training", 1).unwrap();
    assert!(training.collection().is_free_roaming());
}
