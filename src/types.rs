// src/types.rs

//! Identifiers and small closed enums shared across the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for identifiers derived from catalog codes.
///
/// Derived ids are UUID v5 over a `kind:path` name, so the same catalog file
/// always yields the same identifiers.
const CATALOG_NAMESPACE: Uuid = Uuid::from_u128(0x8c0f_44d2_5a7e_4b7a_9e54_51d3_0a6f_2e19);

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Derive a stable id from a catalog path such as `"pets/1"`.
            pub fn derive(path: &str) -> Self {
                let name = format!("{}:{}", $prefix, path);
                Self(Uuid::new_v5(&CATALOG_NAMESPACE, name.as_bytes()))
            }

            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identity of a collection (survey or activity).
    CollectionId,
    "collection"
);
uuid_id!(
    /// Identity of a workflow.
    WorkflowId,
    "workflow"
);
uuid_id!(
    /// Identity of a step within a workflow.
    StepId,
    "step"
);
uuid_id!(
    /// Identity of a question owned by a step.
    QuestionId,
    "question"
);
uuid_id!(
    /// Identity of an engagement (one attempt at a collection).
    EngagementId,
    "engagement"
);

/// Opaque user identity, supplied by the (external) authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of collection this is. Drives navigation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Survey,
    Activity,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Survey => f.write_str("survey"),
            Category::Activity => f.write_str("activity"),
        }
    }
}

/// Closed set of question kinds understood by the schema synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultipleChoice,
    NumericRange,
    DateRange,
    Boolean,
    FreeForm,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 6] = [
        QuestionKind::SingleChoice,
        QuestionKind::MultipleChoice,
        QuestionKind::NumericRange,
        QuestionKind::DateRange,
        QuestionKind::Boolean,
        QuestionKind::FreeForm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::NumericRange => "numeric_range",
            QuestionKind::DateRange => "date_range",
            QuestionKind::Boolean => "boolean",
            QuestionKind::FreeForm => "free_form",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a multiple-choice "correct answer" is matched.
///
/// - `Permutations`: the correct set is expanded into every ordering and the
///   answer must equal one of them (order-sensitive enum).
/// - `SetEquality`: the answer must contain exactly the correct options, in
///   any order, without repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiSelectPolicy {
    Permutations,
    SetEquality,
}

impl Default for MultiSelectPolicy {
    fn default() -> Self {
        MultiSelectPolicy::Permutations
    }
}

impl FromStr for MultiSelectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permutations" => Ok(MultiSelectPolicy::Permutations),
            "set_equality" | "set-equality" => Ok(MultiSelectPolicy::SetEquality),
            other => Err(format!(
                "invalid multi_select_policy: {other} (expected \"permutations\" or \"set_equality\")"
            )),
        }
    }
}
