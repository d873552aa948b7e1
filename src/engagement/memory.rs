// src/engagement/memory.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engagement::store::{EngagementStore, HistoryLookup};
use crate::engagement::{Engagement, EngagementDetail};
use crate::errors::{Result, WayfinderError};
use crate::types::{EngagementId, StepId, UserId};

#[derive(Debug, Default)]
struct StoreState {
    engagements: BTreeMap<EngagementId, Engagement>,
    details: HashMap<(EngagementId, StepId), EngagementDetail>,
}

/// On-disk form of a [`MemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub engagements: Vec<Engagement>,
    #[serde(default)]
    pub details: Vec<EngagementDetail>,
}

/// In-memory engagement store.
///
/// All reads and writes go through one mutex, so the uniqueness checks and
/// the insert they guard happen atomically: of two racing creators exactly
/// one wins and the other gets a conflict.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut state = StoreState::default();
        for e in snapshot.engagements {
            state.engagements.insert(e.id, e);
        }
        for d in snapshot.details {
            state.details.insert((d.engagement_id, d.step_id), d);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let state = self.lock()?;
        let mut details: Vec<EngagementDetail> = state.details.values().cloned().collect();
        details.sort_by(|a, b| {
            (a.engagement_id, a.started, a.step_id).cmp(&(b.engagement_id, b.started, b.step_id))
        });
        Ok(StoreSnapshot {
            engagements: state.engagements.values().cloned().collect(),
            details,
        })
    }

    /// Load a JSON snapshot, or start empty if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = ?path, "store file missing; starting with an empty store");
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading store file {:?}", path))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&contents)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.snapshot()?)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        fs::write(path, json).with_context(|| format!("writing store file {:?}", path))?;
        info!(path = ?path, "saved engagement store");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| WayfinderError::Other(anyhow!("engagement store lock poisoned")))
    }
}

impl HistoryLookup for MemoryStore {
    fn finished_detail(
        &self,
        engagement: &EngagementId,
        step: &StepId,
    ) -> Result<Option<EngagementDetail>> {
        let state = self.lock()?;
        Ok(state
            .details
            .get(&(*engagement, *step))
            .filter(|d| d.is_finished())
            .cloned())
    }

    fn finished_steps(&self, engagement: &EngagementId) -> Result<HashSet<StepId>> {
        let state = self.lock()?;
        Ok(state
            .details
            .values()
            .filter(|d| &d.engagement_id == engagement && d.is_finished())
            .map(|d| d.step_id)
            .collect())
    }

    fn user_finished_step(&self, user: &UserId, step: &StepId) -> Result<bool> {
        let state = self.lock()?;
        Ok(state.details.values().any(|d| {
            &d.step_id == step
                && d.is_finished()
                && state
                    .engagements
                    .get(&d.engagement_id)
                    .is_some_and(|e| &e.user_id == user)
        }))
    }

    fn started_steps(&self, engagement: &EngagementId) -> Result<HashSet<StepId>> {
        let state = self.lock()?;
        Ok(state
            .details
            .keys()
            .filter(|(e, _)| e == engagement)
            .map(|(_, s)| *s)
            .collect())
    }

    fn detail_count(&self, engagement: &EngagementId) -> Result<usize> {
        let state = self.lock()?;
        Ok(state
            .details
            .keys()
            .filter(|(e, _)| e == engagement)
            .count())
    }
}

impl EngagementStore for MemoryStore {
    fn engagement(&self, id: &EngagementId) -> Result<Option<Engagement>> {
        Ok(self.lock()?.engagements.get(id).cloned())
    }

    fn create_engagement(&self, engagement: Engagement) -> Result<Engagement> {
        let mut state = self.lock()?;
        let duplicate = state.engagements.values().any(|e| {
            !e.is_finished()
                && e.user_id == engagement.user_id
                && e.collection_id == engagement.collection_id
        });
        if duplicate {
            warn!(
                user = %engagement.user_id,
                collection = %engagement.collection_id,
                "rejecting second unfinished engagement"
            );
            return Err(WayfinderError::Conflict(format!(
                "user {} already has an unfinished engagement for collection {}",
                engagement.user_id, engagement.collection_id
            )));
        }
        if state.engagements.contains_key(&engagement.id) {
            return Err(WayfinderError::Conflict(format!(
                "engagement {} already exists",
                engagement.id
            )));
        }
        info!(
            engagement = %engagement.id,
            user = %engagement.user_id,
            collection = %engagement.collection_id,
            "engagement created"
        );
        state.engagements.insert(engagement.id, engagement.clone());
        Ok(engagement)
    }

    fn finish_engagement(&self, id: &EngagementId, finished: DateTime<Utc>) -> Result<Engagement> {
        let mut state = self.lock()?;
        let engagement = state
            .engagements
            .get_mut(id)
            .ok_or_else(|| WayfinderError::NotFound(format!("engagement {id}")))?;
        engagement.finished = Some(finished);
        let engagement = engagement.clone();

        let before = state.details.len();
        state
            .details
            .retain(|(e, _), d| e != id || d.is_finished());
        let dropped = before - state.details.len();

        info!(engagement = %id, dropped, "engagement finished; discarded unfinished details");
        Ok(engagement)
    }

    fn detail(&self, engagement: &EngagementId, step: &StepId) -> Result<Option<EngagementDetail>> {
        Ok(self.lock()?.details.get(&(*engagement, *step)).cloned())
    }

    fn insert_detail(&self, detail: EngagementDetail) -> Result<EngagementDetail> {
        let mut state = self.lock()?;
        let key = (detail.engagement_id, detail.step_id);
        if state.details.contains_key(&key) {
            warn!(
                engagement = %detail.engagement_id,
                step = %detail.step_id,
                "rejecting duplicate engagement detail"
            );
            return Err(WayfinderError::Conflict(format!(
                "a detail for step {} already exists in engagement {}",
                detail.step_id, detail.engagement_id
            )));
        }
        debug!(engagement = %detail.engagement_id, step = %detail.step_id, "detail created");
        state.details.insert(key, detail.clone());
        Ok(detail)
    }

    fn update_detail(&self, detail: EngagementDetail) -> Result<EngagementDetail> {
        let mut state = self.lock()?;
        let key = (detail.engagement_id, detail.step_id);
        match state.details.get_mut(&key) {
            Some(existing) => {
                *existing = detail.clone();
                debug!(engagement = %detail.engagement_id, step = %detail.step_id, "detail updated");
                Ok(detail)
            }
            None => Err(WayfinderError::NotFound(format!(
                "no detail for step {} in engagement {}",
                detail.step_id, detail.engagement_id
            ))),
        }
    }
}
