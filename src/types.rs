use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What the user typed for one word, and whether it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub correct: bool,
    pub input: String,
}

/// Responses keyed by word position. Words not yet reached have no entry.
pub type UserResponseMap = BTreeMap<usize, UserResponse>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetrics {
    pub characters_typed: usize,
}
