#![allow(dead_code)]

use chrono::{DateTime, Utc};
use wayfinder::catalog::Catalog;
use wayfinder::engagement::{Engagement, MemoryStore};
use wayfinder::engine::EngagementService;
use wayfinder::types::UserId;

pub use wayfinder_test_utils::fixtures::*;
pub use wayfinder_test_utils::{at, init_tracing};

pub fn alice() -> UserId {
    UserId::new("alice")
}

pub fn bob() -> UserId {
    UserId::new("bob")
}

/// Begin an engagement of `user` with the collection `code`.
pub fn begin(
    catalog: &Catalog,
    store: &MemoryStore,
    user: &UserId,
    code: &str,
    started: DateTime<Utc>,
) -> Engagement {
    EngagementService::new(catalog, store)
        .begin(user, &collection_id(code), started)
        .expect("begin engagement")
}
