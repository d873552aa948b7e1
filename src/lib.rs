// src/lib.rs

pub mod api;
pub mod catalog;
pub mod cli;
pub mod engagement;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod schema;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::api::{ProgressionStateView, StepSubmission};
use crate::catalog::{Catalog, CollectionPlan, load_and_validate};
use crate::cli::{CliArgs, Command, EngagementArgs};
use crate::engagement::MemoryStore;
use crate::engine::{EngagementService, SubmitMode};
use crate::types::{CollectionId, EngagementId, QuestionId, UserId};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the catalog, then runs one subcommand. Commands that
/// touch engagements load the JSON store snapshot first and write it back
/// after a successful change.
pub fn run(args: CliArgs) -> Result<()> {
    let catalog_path = PathBuf::from(&args.catalog);
    let catalog = load_and_validate(&catalog_path)
        .with_context(|| format!("loading catalog {:?}", catalog_path))?;
    debug!(collections = catalog.plans().count(), "catalog loaded");

    match args.command {
        Command::Check => {
            print_summary(&catalog);
            Ok(())
        }
        Command::Schema { question } => {
            let id: QuestionId = question
                .parse()
                .with_context(|| format!("invalid question id '{question}'"))?;
            let store = MemoryStore::new();
            let schema = EngagementService::new(&catalog, &store).schema_for(&id)?;
            print_json(&schema)
        }
        Command::Begin {
            store,
            user,
            collection,
        } => {
            let plan = resolve_collection(&catalog, &collection)?;
            let memory = MemoryStore::load_or_default(&store.store)?;
            let engagement = EngagementService::new(&catalog, &memory).begin(
                &UserId::new(user),
                &plan.collection().id,
                Utc::now(),
            )?;
            memory.save(&store.store)?;
            print_json(&engagement)
        }
        Command::State { target } => {
            let (memory, user, engagement) = open_target(&target)?;
            let state = EngagementService::new(&catalog, &memory).state(&user, &engagement)?;
            print_json(&ProgressionStateView::from(state))
        }
        Command::Submit {
            target,
            body,
            update,
        } => {
            let submission = read_submission(Path::new(&body))?;
            let (memory, user, engagement) = open_target(&target)?;
            let mode = if update {
                SubmitMode::Update
            } else {
                SubmitMode::Create
            };
            let response = EngagementService::new(&catalog, &memory).submit(
                &user,
                &engagement,
                submission,
                mode,
            )?;
            memory.save(&target.store.store)?;
            print_json(&response)
        }
        Command::Finish { target } => {
            let (memory, user, engagement) = open_target(&target)?;
            let engagement =
                EngagementService::new(&catalog, &memory).finish(&user, &engagement, Utc::now())?;
            memory.save(&target.store.store)?;
            print_json(&engagement)
        }
    }
}

fn open_target(target: &EngagementArgs) -> Result<(MemoryStore, UserId, EngagementId)> {
    let engagement: EngagementId = target
        .engagement
        .parse()
        .with_context(|| format!("invalid engagement id '{}'", target.engagement))?;
    let memory = MemoryStore::load_or_default(&target.store.store)?;
    Ok((memory, UserId::new(target.user.clone()), engagement))
}

fn read_submission(path: &Path) -> Result<StepSubmission> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading submission {:?}", path))?;
    let submission = serde_json::from_str(&contents)
        .with_context(|| format!("parsing submission {:?}", path))?;
    Ok(submission)
}

/// Resolve a collection given as a UUID, `code` or `code@version`.
fn resolve_collection<'c>(catalog: &'c Catalog, reference: &str) -> Result<&'c CollectionPlan> {
    if let Ok(id) = reference.parse::<CollectionId>() {
        if let Some(plan) = catalog.plan(&id) {
            return Ok(plan);
        }
    }

    let (code, version) = match reference.split_once('@') {
        Some((code, version)) => {
            let version: u32 = version
                .parse()
                .with_context(|| format!("invalid collection version in '{reference}'"))?;
            (code, version)
        }
        None => (reference, 1),
    };

    match catalog.collection_by_code(code, version) {
        Some(plan) => Ok(plan),
        None => bail!("unknown collection '{reference}'"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dry-run style output: collections, their workflows and steps.
fn print_summary(catalog: &Catalog) {
    let settings = catalog.settings();
    println!("wayfinder catalog check");
    println!("  config.multi_select_policy = {:?}", settings.multi_select_policy);
    println!("  config.max_enumeration = {}", settings.max_enumeration);
    println!();

    for plan in catalog.plans() {
        let collection = plan.collection();
        println!(
            "collection {}@{} ({}, {}) id={}",
            collection.code,
            collection.version,
            collection.category,
            if collection.ordered { "ordered" } else { "unordered" },
            collection.id
        );
        for member in plan.workflows() {
            let Some(workflow) = catalog.workflow(&member.id) else {
                continue;
            };
            println!(
                "  - [{}] workflow {}@{} id={}",
                member.order, workflow.code, workflow.version, workflow.id
            );
            for planned in plan.steps_of(member) {
                let Some(step) = catalog.step(&planned.id) else {
                    continue;
                };
                println!("      {}. {} id={}", step.order, step.code, step.id);
                for question in &step.questions {
                    println!(
                        "         {} ({}{}) id={}",
                        question.code,
                        question.kind,
                        if question.required { ", required" } else { "" },
                        question.id
                    );
                }
                let groups = plan.dependency_groups(&planned.id);
                if !groups.is_empty() {
                    println!("         unlocked by {} dependency group(s)", groups.len());
                }
            }
        }
    }

    info!("catalog is valid");
}
