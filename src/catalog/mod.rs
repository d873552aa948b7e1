// src/catalog/mod.rs

//! Authoring data for wayfinder.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated [`Catalog`] (`model.rs`).
//! - Load a catalog file from disk (`loader.rs`).
//! - Validate structural invariants at load time (`validate.rs`).
//! - Resolve each collection's global step ordering (`plan.rs`).

pub mod loader;
pub mod model;
pub mod plan;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    Catalog, CatalogSettings, Collection, DependencyDetail, DependencyGroup, Question,
    QuestionType, RawCatalog, Step, Workflow,
};
pub use plan::{CollectionPlan, PlannedStep, PlannedWorkflow};
pub use validate::{validate_dependency_detail, validate_question_type, validate_required_response};
