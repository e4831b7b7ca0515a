//! Registry Records
//!
//! API key and model rows as stored in the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common view over prioritized registry rows
pub trait Prioritized {
    fn id(&self) -> &str;
    fn priority(&self) -> i32;
    fn is_active(&self) -> bool;
}

/// A named upstream API key
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub id: String,

    /// Human label, reported back as `key_used`
    pub key_name: String,

    /// Bearer secret sent upstream
    pub api_key: String,

    /// Lower is tried first
    pub priority: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Create an active credential
    pub fn new(
        id: impl Into<String>,
        key_name: impl Into<String>,
        api_key: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            key_name: key_name.into(),
            api_key: api_key.into(),
            priority,
            is_active: true,
            created_at: None,
        }
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// The secret with everything but the last four characters masked
    pub fn masked_key(&self) -> String {
        let visible: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("****{}", visible)
    }
}

// The secret must never reach logs through `{:?}`.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("key_name", &self.key_name)
            .field("api_key", &self.masked_key())
            .field("priority", &self.priority)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Prioritized for Credential {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// An upstream model identifier with its display label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: String,

    /// Identifier sent upstream (e.g. "openai/gpt-4o-mini")
    pub model_name: String,

    pub display_name: String,

    /// Lower is tried first
    pub priority: i32,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ModelSpec {
    /// Create an active model
    pub fn new(
        id: impl Into<String>,
        model_name: impl Into<String>,
        display_name: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            id: id.into(),
            model_name: model_name.into(),
            display_name: display_name.into(),
            priority,
            is_active: true,
            created_at: None,
        }
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

impl Prioritized for ModelSpec {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

fn default_active() -> bool {
    true
}

/// Priority for a newly created record: one past the current maximum, or 0
pub fn next_priority<T: Prioritized>(records: &[T]) -> i32 {
    records
        .iter()
        .map(Prioritized::priority)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Active records in ascending priority; ties keep their incoming order
pub fn active_in_priority_order<T: Prioritized + Clone>(records: &[T]) -> Vec<T> {
    let mut active: Vec<T> = records.iter().filter(|r| r.is_active()).cloned().collect();
    active.sort_by_key(Prioritized::priority);
    active
}
