//! Dispatch Plan
//!
//! Lazy enumeration of (key, model) pairs in the order they are attempted.

use crate::registry::{Credential, ModelSpec};

/// One (key, model) pairing for a single outbound call
#[derive(Debug, Clone, Copy)]
pub struct DispatchAttempt<'a> {
    /// Zero-based position in the plan
    pub ordinal: usize,
    pub credential: &'a Credential,
    pub model: &'a ModelSpec,
}

/// Every pair, keys as the outer loop and models as the inner loop.
///
/// Both slices must already be in ascending priority order, so all models
/// are exhausted for a key before the next key is tried.
pub fn dispatch_plan<'a>(
    credentials: &'a [Credential],
    models: &'a [ModelSpec],
) -> impl Iterator<Item = DispatchAttempt<'a>> + 'a {
    credentials
        .iter()
        .flat_map(move |credential| models.iter().map(move |model| (credential, model)))
        .enumerate()
        .map(|(ordinal, (credential, model))| DispatchAttempt {
            ordinal,
            credential,
            model,
        })
}
