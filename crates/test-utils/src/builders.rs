#![allow(dead_code)]

use serde_json::{Value, json};
use wayfinder::catalog::model::{
    CatalogSettings, CollectionConfig, DependencyDetailConfig, DependencyGroupConfig,
    MembershipConfig, QuestionConfig, StepConfig, StepRef, WorkflowConfig,
};
use wayfinder::catalog::{Catalog, RawCatalog};
use wayfinder::types::{Category, MultiSelectPolicy, QuestionKind};

/// Builder for `Catalog` to simplify test setup.
pub struct CatalogBuilder {
    raw: RawCatalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawCatalog {
                config: CatalogSettings::default(),
                question_types: vec![],
                workflows: vec![],
                collections: vec![],
            },
        }
    }

    pub fn multi_select_policy(mut self, policy: MultiSelectPolicy) -> Self {
        self.raw.config.multi_select_policy = policy;
        self
    }

    pub fn max_enumeration(mut self, limit: usize) -> Self {
        self.raw.config.max_enumeration = limit;
        self
    }

    pub fn workflow(mut self, workflow: WorkflowConfig) -> Self {
        self.raw.workflows.push(workflow);
        self
    }

    pub fn collection(mut self, collection: CollectionConfig) -> Self {
        self.raw.collections.push(collection);
        self
    }

    /// The raw (unvalidated) catalog, for tests that expect validation errors.
    pub fn build_raw(self) -> RawCatalog {
        self.raw
    }

    pub fn build(self) -> Catalog {
        Catalog::try_from(self.raw).expect("Failed to build valid catalog from builder")
    }
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WorkflowConfig`.
pub struct WorkflowBuilder {
    workflow: WorkflowConfig,
}

impl WorkflowBuilder {
    pub fn new(code: &str) -> Self {
        Self {
            workflow: WorkflowConfig {
                id: None,
                code: code.to_string(),
                version: 1,
                title: None,
                steps: vec![],
            },
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.workflow.version = version;
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.workflow.steps.push(step);
        self
    }

    /// Append a step with no questions; its order is its 1-based index.
    pub fn plain_step(self, code: &str) -> Self {
        let order = self.workflow.steps.len() as u32 + 1;
        self.step(StepBuilder::new(code, order).build())
    }

    pub fn build(self) -> WorkflowConfig {
        self.workflow
    }
}

/// Builder for `StepConfig`.
pub struct StepBuilder {
    step: StepConfig,
}

impl StepBuilder {
    pub fn new(code: &str, order: u32) -> Self {
        Self {
            step: StepConfig {
                id: None,
                code: code.to_string(),
                order,
                title: None,
                questions: vec![],
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.step.title = Some(title.to_string());
        self
    }

    pub fn question(mut self, question: QuestionConfig) -> Self {
        self.step.questions.push(question);
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}

/// Builder for `QuestionConfig`.
pub struct QuestionBuilder {
    question: QuestionConfig,
}

impl QuestionBuilder {
    pub fn new(code: &str, kind: QuestionKind) -> Self {
        Self {
            question: QuestionConfig {
                id: None,
                code: code.to_string(),
                kind,
                required: false,
                specification: json!({}),
            },
        }
    }

    pub fn single_choice(code: &str, options: Value) -> Self {
        Self::new(code, QuestionKind::SingleChoice).specification(json!({ "inputOptions": options }))
    }

    pub fn multiple_choice(code: &str, options: Value) -> Self {
        Self::new(code, QuestionKind::MultipleChoice)
            .specification(json!({ "inputOptions": options }))
    }

    pub fn free_form(code: &str) -> Self {
        Self::new(code, QuestionKind::FreeForm)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.question.required = required;
        self
    }

    pub fn specification(mut self, specification: Value) -> Self {
        self.question.specification = specification;
        self
    }

    /// Set `meta.inputRequired` / `meta.correctInputRequired`.
    pub fn meta(mut self, input_required: bool, correct_input_required: bool) -> Self {
        if let Value::Object(map) = &mut self.question.specification {
            map.insert(
                "meta".to_string(),
                json!({
                    "inputRequired": input_required,
                    "correctInputRequired": correct_input_required,
                }),
            );
        }
        self
    }

    pub fn correct_input(mut self, correct: Value) -> Self {
        if let Value::Object(map) = &mut self.question.specification {
            map.insert("correctInput".to_string(), correct);
        }
        self
    }

    pub fn build(self) -> QuestionConfig {
        self.question
    }
}

/// Builder for `CollectionConfig`.
pub struct CollectionBuilder {
    collection: CollectionConfig,
}

impl CollectionBuilder {
    pub fn new(code: &str, category: Category) -> Self {
        Self {
            collection: CollectionConfig {
                id: None,
                code: code.to_string(),
                version: 1,
                category,
                ordered: false,
                members: vec![],
                dependency_groups: vec![],
            },
        }
    }

    pub fn survey(code: &str) -> Self {
        Self::new(code, Category::Survey).ordered(true)
    }

    pub fn activity(code: &str) -> Self {
        Self::new(code, Category::Activity)
    }

    pub fn ordered(mut self, ordered: bool) -> Self {
        self.collection.ordered = ordered;
        self
    }

    pub fn member(mut self, workflow: &str, order: u32) -> Self {
        self.collection.members.push(MembershipConfig {
            workflow: workflow.to_string(),
            version: 1,
            order,
        });
        self
    }

    /// Add one dependency group on `step`: every `(prerequisite, response)`
    /// pair must hold.
    pub fn group(mut self, step: (&str, &str), details: Vec<((&str, &str), Value)>) -> Self {
        self.collection.dependency_groups.push(DependencyGroupConfig {
            step: step_ref(step),
            details: details
                .into_iter()
                .map(|(prerequisite, required_response)| DependencyDetailConfig {
                    prerequisite: step_ref(prerequisite),
                    required_response,
                })
                .collect(),
        });
        self
    }

    pub fn build(self) -> CollectionConfig {
        self.collection
    }
}

fn step_ref((workflow, step): (&str, &str)) -> StepRef {
    StepRef {
        workflow: workflow.to_string(),
        step: step.to_string(),
    }
}

/// `required_response` matching an answer whose value equals `value`.
pub fn answer_equals(value: Value) -> Value {
    json!({
        "type": "object",
        "properties": { "value": { "const": value } },
        "required": ["value"],
    })
}

/// `required_response` satisfied by any finished prerequisite.
pub fn step_finished() -> Value {
    json!({ "type": "array" })
}
