// src/catalog/validate.rs

//! Authoring-time validation.
//!
//! Everything structural is rejected here, with a field path, so that the
//! engine never sees a forward-pointing dependency, a duplicate order or a
//! malformed schema.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::catalog::model::{
    Catalog, CatalogSettings, Collection, CollectionConfig, DependencyDetail, DependencyGroup,
    QuestionType, QuestionTypeConfig, RawCatalog, Step, StepRef, Workflow, WorkflowConfig,
    Question,
};
use crate::catalog::plan::CollectionPlan;
use crate::errors::{Result, WayfinderError};
use crate::schema::{CompiledSchema, SchemaDocument};
use crate::schema::synth::{builtin_question_type, synthesize};
use crate::types::{CollectionId, QuestionId, QuestionKind, StepId, WorkflowId};

impl TryFrom<RawCatalog> for Catalog {
    type Error = WayfinderError;

    fn try_from(raw: RawCatalog) -> std::result::Result<Self, Self::Error> {
        ensure_has_collections(&raw)?;
        validate_settings(&raw.config)?;

        let question_types = build_question_types(&raw.question_types)?;

        let mut workflows = BTreeMap::new();
        let mut steps = HashMap::new();
        let mut question_index = HashMap::new();
        let mut seen_workflows = HashSet::new();
        for (i, wc) in raw.workflows.iter().enumerate() {
            let field = format!("workflows[{i}]");
            if !seen_workflows.insert((wc.code.as_str(), wc.version)) {
                return Err(WayfinderError::field(
                    field,
                    format!("duplicate workflow {}/{}", wc.code, wc.version),
                ));
            }
            let workflow = build_workflow(
                wc,
                &field,
                &raw.config,
                &question_types,
                &mut steps,
                &mut question_index,
            )?;
            if workflows.insert(workflow.id, workflow).is_some() {
                return Err(WayfinderError::field(field, "duplicate workflow id"));
            }
        }

        let mut plans = BTreeMap::new();
        let mut seen_collections = HashSet::new();
        for (i, cc) in raw.collections.iter().enumerate() {
            let field = format!("collections[{i}]");
            if !seen_collections.insert((cc.code.as_str(), cc.version)) {
                return Err(WayfinderError::field(
                    field,
                    format!("duplicate collection {}/{}", cc.code, cc.version),
                ));
            }
            let plan = build_collection(cc, &field, &workflows, &steps)?;
            let id = plan.collection().id;
            if plans.insert(id, plan).is_some() {
                return Err(WayfinderError::field(field, "duplicate collection id"));
            }
        }

        Ok(Catalog {
            settings: raw.config,
            question_types,
            workflows,
            steps,
            question_index,
            plans,
        })
    }
}

fn ensure_has_collections(raw: &RawCatalog) -> Result<()> {
    if raw.collections.is_empty() {
        return Err(WayfinderError::CatalogError(
            "catalog must contain at least one [[collections]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_settings(settings: &CatalogSettings) -> Result<()> {
    if settings.max_enumeration == 0 {
        return Err(WayfinderError::field(
            "config.max_enumeration",
            "must be >= 1 (got 0)",
        ));
    }
    Ok(())
}

/// Check a question type: its `json_schema` must be well-formed and its
/// `example_specification` must satisfy it.
pub fn validate_question_type(
    kind: QuestionKind,
    json_schema: &Value,
    example_specification: &Value,
) -> Result<QuestionType> {
    let qt = QuestionType::new(
        kind,
        SchemaDocument::new(json_schema.clone()),
        example_specification.clone(),
    )
    .map_err(|e| {
        WayfinderError::field(format!("question_types[{kind}].json_schema"), e.to_string())
    })?;
    if let Some(failure) = qt.validator().validate(example_specification).into_iter().next() {
        return Err(WayfinderError::field(
            format!("question_types[{kind}].example_specification"),
            format!(
                "does not satisfy json_schema at `{}`: {}",
                failure.instance_path, failure.message
            ),
        ));
    }
    Ok(qt)
}

/// Check an authored `required_response` document is a well-formed schema
/// and compile it.
pub fn validate_required_response(
    required_response: &Value,
) -> Result<(SchemaDocument, CompiledSchema)> {
    let doc = SchemaDocument::new(required_response.clone());
    let compiled = doc
        .compile()
        .map_err(|e| WayfinderError::field("required_response", e.to_string()))?;
    Ok((doc, compiled))
}

/// Check a single dependency detail against a collection's step ordering.
///
/// The prerequisite must belong to the collection, differ from the dependent
/// step, and come strictly earlier in global order. This is what keeps
/// dependencies acyclic.
pub fn validate_dependency_detail(
    plan: &CollectionPlan,
    step: &StepId,
    prerequisite: &StepId,
    required_response: &Value,
) -> Result<DependencyDetail> {
    let step_pos = plan.position_of(step).ok_or_else(|| {
        WayfinderError::field("step", format!("step {step} is not a member of this collection"))
    })?;
    let prereq_pos = plan.position_of(prerequisite).ok_or_else(|| {
        WayfinderError::field(
            "prerequisite",
            format!("step {prerequisite} is not a member of this collection"),
        )
    })?;
    if step == prerequisite {
        return Err(WayfinderError::field(
            "prerequisite",
            "a step cannot depend on itself",
        ));
    }
    if prereq_pos >= step_pos {
        return Err(WayfinderError::field(
            "prerequisite",
            format!(
                "prerequisite must come before the dependent step (position {prereq_pos} >= {step_pos})"
            ),
        ));
    }
    let (required_response, matcher) = validate_required_response(required_response)?;
    Ok(DependencyDetail {
        prerequisite: *prerequisite,
        required_response,
        matcher,
    })
}

fn build_question_types(
    overrides: &[QuestionTypeConfig],
) -> Result<BTreeMap<QuestionKind, QuestionType>> {
    let mut types = BTreeMap::new();
    for cfg in overrides {
        if types.contains_key(&cfg.kind) {
            return Err(WayfinderError::field(
                format!("question_types[{}]", cfg.kind),
                "question type declared more than once",
            ));
        }
        let qt = validate_question_type(cfg.kind, &cfg.json_schema, &cfg.example_specification)?;
        types.insert(cfg.kind, qt);
    }
    for kind in QuestionKind::ALL {
        if !types.contains_key(&kind) {
            let (schema, example) = builtin_question_type(kind);
            types.insert(kind, QuestionType::new(kind, schema, example)?);
        }
    }
    Ok(types)
}

fn build_workflow(
    wc: &WorkflowConfig,
    field: &str,
    settings: &CatalogSettings,
    question_types: &BTreeMap<QuestionKind, QuestionType>,
    steps: &mut HashMap<StepId, Step>,
    question_index: &mut HashMap<QuestionId, StepId>,
) -> Result<Workflow> {
    if wc.code.trim().is_empty() {
        return Err(WayfinderError::field(format!("{field}.code"), "must not be empty"));
    }
    let path = format!("{}/{}", wc.code, wc.version);
    let workflow_id = wc.id.unwrap_or_else(|| WorkflowId::derive(&path));

    let mut orders = HashSet::new();
    let mut codes = HashSet::new();
    let mut built: Vec<Step> = Vec::with_capacity(wc.steps.len());

    for (si, sc) in wc.steps.iter().enumerate() {
        let step_field = format!("{field}.steps[{si}]");
        if sc.order == 0 {
            return Err(WayfinderError::field(
                format!("{step_field}.order"),
                "must be >= 1",
            ));
        }
        if !orders.insert(sc.order) {
            return Err(WayfinderError::field(
                format!("{step_field}.order"),
                format!("order {} is used by another step of workflow {path}", sc.order),
            ));
        }
        if !codes.insert(sc.code.as_str()) {
            return Err(WayfinderError::field(
                format!("{step_field}.code"),
                format!("duplicate step code '{}' in workflow {path}", sc.code),
            ));
        }

        let step_path = format!("{path}/{}", sc.code);
        let step_id = sc.id.unwrap_or_else(|| StepId::derive(&step_path));

        let mut question_codes = HashSet::new();
        let mut questions = Vec::with_capacity(sc.questions.len());
        for (qi, qc) in sc.questions.iter().enumerate() {
            let q_field = format!("{step_field}.questions[{qi}]");
            if !question_codes.insert(qc.code.as_str()) {
                return Err(WayfinderError::field(
                    format!("{q_field}.code"),
                    format!("duplicate question code '{}' in step {step_path}", qc.code),
                ));
            }
            let id = qc
                .id
                .unwrap_or_else(|| QuestionId::derive(&format!("{step_path}/{}", qc.code)));
            let (answer_schema, answer_validator) =
                validate_question(qc.kind, &qc.specification, &q_field, settings, question_types)?;
            let question = Question {
                id,
                step_id,
                code: qc.code.clone(),
                kind: qc.kind,
                required: qc.required,
                specification: qc.specification.clone(),
                answer_schema,
                answer_validator,
            };
            if question_index.insert(question.id, step_id).is_some() {
                return Err(WayfinderError::field(q_field, "duplicate question id"));
            }
            questions.push(question);
        }

        built.push(Step {
            id: step_id,
            workflow_id,
            code: sc.code.clone(),
            order: sc.order,
            title: sc.title.clone(),
            questions,
        });
    }

    built.sort_by_key(|s| s.order);
    let step_ids = built.iter().map(|s| s.id).collect();
    for step in built {
        let id = step.id;
        if steps.insert(id, step).is_some() {
            return Err(WayfinderError::field(field, format!("duplicate step id {id}")));
        }
    }

    Ok(Workflow {
        id: workflow_id,
        code: wc.code.clone(),
        version: wc.version,
        title: wc.title.clone(),
        steps: step_ids,
    })
}

/// A question's specification must satisfy its type's schema and must be
/// synthesizable with the catalog's settings. Returns the answer schema and
/// its compiled form.
fn validate_question(
    kind: QuestionKind,
    specification: &Value,
    field: &str,
    settings: &CatalogSettings,
    question_types: &BTreeMap<QuestionKind, QuestionType>,
) -> Result<(SchemaDocument, CompiledSchema)> {
    let spec_field = format!("{field}.specification");
    if let Some(qt) = question_types.get(&kind) {
        if let Some(failure) = qt.validator().validate(specification).into_iter().next() {
            return Err(WayfinderError::field(
                spec_field,
                format!(
                    "does not satisfy the {kind} question type at `{}`: {}",
                    failure.instance_path, failure.message
                ),
            ));
        }
    }
    let schema = synthesize(kind, specification, &settings.synthesis_options())
        .map_err(|e| WayfinderError::field(spec_field.clone(), e.to_string()))?;
    let compiled = schema
        .compile()
        .map_err(|e| WayfinderError::field(spec_field, e.to_string()))?;
    Ok((schema, compiled))
}

fn build_collection(
    cc: &CollectionConfig,
    field: &str,
    workflows: &BTreeMap<WorkflowId, Workflow>,
    steps: &HashMap<StepId, Step>,
) -> Result<CollectionPlan> {
    if cc.code.trim().is_empty() {
        return Err(WayfinderError::field(format!("{field}.code"), "must not be empty"));
    }
    let collection = Collection {
        id: cc
            .id
            .unwrap_or_else(|| CollectionId::derive(&format!("{}/{}", cc.code, cc.version))),
        code: cc.code.clone(),
        version: cc.version,
        category: cc.category,
        ordered: cc.ordered,
    };

    let mut orders = HashSet::new();
    let mut member_codes: HashMap<&str, &Workflow> = HashMap::new();
    let mut members = Vec::with_capacity(cc.members.len());
    for (mi, mc) in cc.members.iter().enumerate() {
        let m_field = format!("{field}.members[{mi}]");
        if mc.order == 0 {
            return Err(WayfinderError::field(format!("{m_field}.order"), "must be >= 1"));
        }
        if !orders.insert(mc.order) {
            return Err(WayfinderError::field(
                format!("{m_field}.order"),
                format!("order {} is used by another member of {}", mc.order, cc.code),
            ));
        }
        let workflow = workflows
            .values()
            .find(|w| w.code == mc.workflow && w.version == mc.version)
            .ok_or_else(|| {
                WayfinderError::field(
                    format!("{m_field}.workflow"),
                    format!("unknown workflow {}/{}", mc.workflow, mc.version),
                )
            })?;
        if member_codes.insert(workflow.code.as_str(), workflow).is_some() {
            return Err(WayfinderError::field(
                format!("{m_field}.workflow"),
                format!("workflow '{}' is already a member of {}", mc.workflow, cc.code),
            ));
        }
        members.push((mc.order, workflow));
    }

    let mut plan = CollectionPlan::new(collection, members, steps);

    for (gi, gc) in cc.dependency_groups.iter().enumerate() {
        let g_field = format!("{field}.dependency_groups[{gi}]");
        let step = resolve_step_ref(&gc.step, &member_codes, steps, &format!("{g_field}.step"))?;
        if gc.details.is_empty() {
            return Err(WayfinderError::field(
                format!("{g_field}.details"),
                "a dependency group needs at least one detail",
            ));
        }
        let mut details = Vec::with_capacity(gc.details.len());
        for (di, dc) in gc.details.iter().enumerate() {
            let d_field = format!("{g_field}.details[{di}]");
            let prerequisite = resolve_step_ref(
                &dc.prerequisite,
                &member_codes,
                steps,
                &format!("{d_field}.prerequisite"),
            )?;
            let detail = validate_dependency_detail(&plan, &step, &prerequisite, &dc.required_response)
                .map_err(|e| prefix_field(e, &d_field))?;
            details.push(detail);
        }
        plan.add_group(DependencyGroup { step, details });
    }

    Ok(plan)
}

fn resolve_step_ref(
    step_ref: &StepRef,
    members: &HashMap<&str, &Workflow>,
    steps: &HashMap<StepId, Step>,
    field: &str,
) -> Result<StepId> {
    let workflow = members.get(step_ref.workflow.as_str()).ok_or_else(|| {
        WayfinderError::field(
            field,
            format!("workflow '{}' is not a member of this collection", step_ref.workflow),
        )
    })?;
    workflow
        .steps
        .iter()
        .find(|id| steps.get(id).is_some_and(|s| s.code == step_ref.step))
        .copied()
        .ok_or_else(|| WayfinderError::field(field, format!("unknown step {step_ref}")))
}

fn prefix_field(err: WayfinderError, prefix: &str) -> WayfinderError {
    match err {
        WayfinderError::FieldError { field, message } => WayfinderError::FieldError {
            field: format!("{prefix}.{field}"),
            message,
        },
        other => other,
    }
}
