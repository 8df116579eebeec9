//! Process and task variables.
//!
//! Variables are JSON values keyed by name. A process instance carries one
//! process-scope bag and any number of task-scope bags; [`merge`] layers one
//! over the other.

use serde_json::Value;
use std::collections::BTreeMap;

/// A named bag of variable values.
pub type Variables = BTreeMap<String, Value>;

/// Bookkeeping variable names written by submission and completion.
pub mod keys {
    pub const USER_ID: &str = "userId";
    pub const USER_NAME: &str = "userName";
    pub const INITIATOR_ID: &str = "initiatorId";
    pub const INITIATOR_NAME: &str = "initiatorName";
    pub const ASSIGNEE_ID: &str = "assigneeId";
    pub const ASSIGNEE_NAME: &str = "assigneeName";
    pub const TITLE: &str = "title";
    pub const SKIP: &str = "skip";
    pub const SKIP_ENABLED: &str = "_FLOWABLE_SKIP_EXPRESSION_ENABLED";
    pub const PASS: &str = "pass";
}

/// Layer `overrides` on top of `base`.
///
/// Always returns a fresh map; an absent override yields a copy of `base`.
pub fn merge(base: &Variables, overrides: Option<&Variables>) -> Variables {
    let mut merged = base.clone();
    if let Some(overrides) = overrides {
        extend(&mut merged, overrides);
    }
    merged
}

/// Write every entry of `src` into `dst`, replacing same-named keys.
pub fn extend(dst: &mut Variables, src: &Variables) {
    for (name, value) in src {
        dst.insert(name.clone(), value.clone());
    }
}
