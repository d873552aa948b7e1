// src/engine/mod.rs

//! Progression engine for wayfinder.
//!
//! This module ties together:
//! - dependency evaluation (is a step unlocked?)
//! - progression state (next / previous step, counters)
//! - submission legality and scoring
//!
//! The first three are pure: they read a [`CollectionPlan`](crate::catalog::CollectionPlan)
//! and a [`HistoryLookup`](crate::engagement::HistoryLookup) and never write.
//! The read-compute-write shell around them lives in [`service`].

pub mod dependency;
pub mod progression;
pub mod service;
pub mod submission;

pub use dependency::{DependencyEvaluator, answers_satisfy};
pub use progression::{Progress, ProgressionEngine, ProgressionState, StepPointer};
pub use service::{EngagementService, SubmitMode};
pub use submission::{Scored, SubmissionValidator};
