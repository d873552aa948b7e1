// src/catalog/model.rs

//! Authoring data: the TOML-backed raw model and the validated [`Catalog`].
//!
//! A catalog file looks like:
//!
//! ```toml
//! [config]
//! multi_select_policy = "permutations"
//!
//! [[workflows]]
//! code = "pets"
//! version = 1
//!
//!   [[workflows.steps]]
//!   code = "cat_or_dog"
//!   order = 1
//!
//!     [[workflows.steps.questions]]
//!     code = "pet"
//!     kind = "single_choice"
//!     required = true
//!     specification = { inputOptions = ["cat", "dog"] }
//!
//! [[collections]]
//! code = "pets-survey"
//! category = "survey"
//! ordered = true
//!
//!   [[collections.members]]
//!   workflow = "pets"
//!   order = 1
//! ```
//!
//! All sections are optional at the serde level; [`crate::catalog::validate`]
//! enforces what must be present.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::plan::CollectionPlan;
use crate::schema::synth::DEFAULT_MAX_ENUMERATION;
use crate::schema::{CompiledSchema, SchemaDocument, SchemaError, SynthesisOptions};
use crate::types::{
    Category, CollectionId, MultiSelectPolicy, QuestionId, QuestionKind, StepId, WorkflowId,
};

/// Top-level catalog as read from a TOML file, before validation.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawCatalog {
    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: CatalogSettings,

    /// Optional overrides of the built-in question types.
    #[serde(default)]
    pub question_types: Vec<QuestionTypeConfig>,

    #[serde(default)]
    pub workflows: Vec<WorkflowConfig>,

    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CatalogSettings {
    /// `"permutations"` (default) or `"set_equality"`.
    #[serde(default)]
    pub multi_select_policy: MultiSelectPolicy,

    /// Upper bound on the number of values an answer schema may enumerate.
    #[serde(default = "default_max_enumeration")]
    pub max_enumeration: usize,
}

fn default_max_enumeration() -> usize {
    DEFAULT_MAX_ENUMERATION
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            multi_select_policy: MultiSelectPolicy::default(),
            max_enumeration: default_max_enumeration(),
        }
    }
}

impl CatalogSettings {
    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            multi_select: self.multi_select_policy,
            max_enumeration: self.max_enumeration,
        }
    }
}

/// `[[question_types]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionTypeConfig {
    pub kind: QuestionKind,
    pub json_schema: Value,
    pub example_specification: Value,
}

/// `[[workflows]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Explicit id; derived from `code`/`version` when absent.
    #[serde(default)]
    pub id: Option<WorkflowId>,
    pub code: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// `[[workflows.steps]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    #[serde(default)]
    pub id: Option<StepId>,
    pub code: String,
    /// Position within the workflow; unique, >= 1.
    pub order: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionConfig>,
}

/// `[[workflows.steps.questions]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionConfig {
    #[serde(default)]
    pub id: Option<QuestionId>,
    /// Stable textual identifier, echoed as `question_identifier` in answers.
    pub code: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "empty_object")]
    pub specification: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// `[[collections]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub id: Option<CollectionId>,
    pub code: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub category: Category,
    /// Whether member workflows must be completed in sequence.
    #[serde(default)]
    pub ordered: bool,
    #[serde(default)]
    pub members: Vec<MembershipConfig>,
    #[serde(default)]
    pub dependency_groups: Vec<DependencyGroupConfig>,
}

/// `[[collections.members]]` entry: joins a workflow into a collection.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipConfig {
    pub workflow: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub order: u32,
}

/// Reference to a step by workflow code and step code, resolved against the
/// members of the enclosing collection.
#[derive(Debug, Clone, Deserialize)]
pub struct StepRef {
    pub workflow: String,
    pub step: String,
}

impl std::fmt::Display for StepRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.workflow, self.step)
    }
}

/// `[[collections.dependency_groups]]` entry; groups on the same step are OR-ed.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyGroupConfig {
    pub step: StepRef,
    #[serde(default)]
    pub details: Vec<DependencyDetailConfig>,
}

/// `[[collections.dependency_groups.details]]` entry; details are AND-ed.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyDetailConfig {
    pub prerequisite: StepRef,
    pub required_response: Value,
}

fn default_version() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Validated model
// ---------------------------------------------------------------------------

/// Schema every specification of `kind` must satisfy, plus a sample.
#[derive(Debug, Clone)]
pub struct QuestionType {
    pub kind: QuestionKind,
    pub json_schema: SchemaDocument,
    pub example_specification: Value,
    pub(crate) validator: CompiledSchema,
}

impl QuestionType {
    pub fn new(
        kind: QuestionKind,
        json_schema: SchemaDocument,
        example_specification: Value,
    ) -> Result<Self, SchemaError> {
        let validator = json_schema.compile()?;
        Ok(Self {
            kind,
            json_schema,
            example_specification,
            validator,
        })
    }

    pub fn validator(&self) -> &CompiledSchema {
        &self.validator
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: QuestionId,
    pub step_id: StepId,
    pub code: String,
    pub kind: QuestionKind,
    pub required: bool,
    pub specification: Value,
    /// Synthesized once with the catalog's [`SynthesisOptions`].
    pub(crate) answer_schema: SchemaDocument,
    pub(crate) answer_validator: CompiledSchema,
}

impl Question {
    pub fn answer_schema(&self) -> &SchemaDocument {
        &self.answer_schema
    }

    /// Whether an `{question_id, value}` envelope satisfies the answer schema.
    pub fn accepts(&self, envelope: &Value) -> bool {
        self.answer_validator.is_valid(envelope)
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub id: StepId,
    pub workflow_id: WorkflowId,
    pub code: String,
    pub order: u32,
    pub title: Option<String>,
    pub questions: Vec<Question>,
}

impl Step {
    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.required)
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: WorkflowId,
    pub code: String,
    pub version: u32,
    pub title: Option<String>,
    /// Step ids sorted by step `order`.
    pub steps: Vec<StepId>,
}

#[derive(Debug, Clone)]
pub struct Collection {
    pub id: CollectionId,
    pub code: String,
    pub version: u32,
    pub category: Category,
    pub ordered: bool,
}

impl Collection {
    /// Unordered activities let the user pick any workflow to work on.
    pub fn is_free_roaming(&self) -> bool {
        self.category == Category::Activity && !self.ordered
    }
}

/// One AND-ed prerequisite of a dependency group.
#[derive(Debug, Clone)]
pub struct DependencyDetail {
    pub prerequisite: StepId,
    pub required_response: SchemaDocument,
    pub(crate) matcher: CompiledSchema,
}

impl DependencyDetail {
    pub fn new(prerequisite: StepId, required_response: SchemaDocument) -> Result<Self, SchemaError> {
        let matcher = required_response.compile()?;
        Ok(Self {
            prerequisite,
            required_response,
            matcher,
        })
    }

    pub fn matcher(&self) -> &CompiledSchema {
        &self.matcher
    }
}

/// A set of details that together unlock `step`.
#[derive(Debug, Clone)]
pub struct DependencyGroup {
    pub step: StepId,
    pub details: Vec<DependencyDetail>,
}

/// Validated authoring data.
///
/// Construct with `Catalog::try_from(raw)` (see [`crate::catalog::validate`]).
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) settings: CatalogSettings,
    pub(crate) question_types: BTreeMap<QuestionKind, QuestionType>,
    pub(crate) workflows: BTreeMap<WorkflowId, Workflow>,
    pub(crate) steps: HashMap<StepId, Step>,
    pub(crate) question_index: HashMap<QuestionId, StepId>,
    pub(crate) plans: BTreeMap<CollectionId, CollectionPlan>,
}

impl Catalog {
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        self.settings.synthesis_options()
    }

    pub fn question_type(&self, kind: QuestionKind) -> Option<&QuestionType> {
        self.question_types.get(&kind)
    }

    pub fn plan(&self, id: &CollectionId) -> Option<&CollectionPlan> {
        self.plans.get(id)
    }

    pub fn plans(&self) -> impl Iterator<Item = &CollectionPlan> {
        self.plans.values()
    }

    pub fn collection_by_code(&self, code: &str, version: u32) -> Option<&CollectionPlan> {
        self.plans
            .values()
            .find(|p| p.collection().code == code && p.collection().version == version)
    }

    pub fn workflow(&self, id: &WorkflowId) -> Option<&Workflow> {
        self.workflows.get(id)
    }

    pub fn workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.values()
    }

    pub fn workflow_by_code(&self, code: &str, version: u32) -> Option<&Workflow> {
        self.workflows
            .values()
            .find(|w| w.code == code && w.version == version)
    }

    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        let step = self.question_index.get(id)?;
        self.steps.get(step)?.question(id)
    }
}
