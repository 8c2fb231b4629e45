// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Device context registry.
//!
//! Host environments address compute contexts by small integer ids; buffers
//! record the id of the context they were allocated under and operations
//! verify that every operand agrees. Id 0 is the default CPU context and is
//! always present.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Id of the default CPU context, registered on first registry access.
pub const DEFAULT_CONTEXT_ID: u32 = 0;

/// Errors raised when resolving or registering device contexts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no device context registered under id {id}")]
    UnknownContext { id: u32 },

    #[error("a device context is already registered under id {id}")]
    DuplicateContext { id: u32 },
}

/// Kind of compute device a context selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    Cpu,
    #[cfg(feature = "wgpu")]
    Wgpu,
}

impl ContextKind {
    pub const fn label(self) -> &'static str {
        match self {
            ContextKind::Cpu => "cpu",
            #[cfg(feature = "wgpu")]
            ContextKind::Wgpu => "wgpu",
        }
    }
}

/// A compute context buffers are allocated under.
///
/// Contexts are externally owned for the lifetime of the process; the
/// registry hands out shared references and never drops an entry.
#[derive(Debug)]
pub struct DeviceContext {
    id: u32,
    kind: ContextKind,
}

impl DeviceContext {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Whether kernels issued under this context run on an accelerator.
    pub fn is_accelerated(&self) -> bool {
        !matches!(self.kind, ContextKind::Cpu)
    }
}

static REGISTRY: Lazy<RwLock<HashMap<u32, Arc<DeviceContext>>>> = Lazy::new(|| {
    let mut contexts = HashMap::new();
    contexts.insert(
        DEFAULT_CONTEXT_ID,
        Arc::new(DeviceContext {
            id: DEFAULT_CONTEXT_ID,
            kind: ContextKind::Cpu,
        }),
    );
    RwLock::new(contexts)
});

/// Resolves a context by its integer id.
pub fn context(id: u32) -> Result<Arc<DeviceContext>, ContextError> {
    let registry = REGISTRY.read().unwrap_or_else(|poison| poison.into_inner());
    registry
        .get(&id)
        .cloned()
        .ok_or(ContextError::UnknownContext { id })
}

/// Returns true when a context is registered under `id`.
pub fn context_exists(id: u32) -> bool {
    let registry = REGISTRY.read().unwrap_or_else(|poison| poison.into_inner());
    registry.contains_key(&id)
}

/// Registers a new context under an explicit id.
///
/// Ids are host-assigned; registering the same id twice is a caller error.
pub fn register_context(id: u32, kind: ContextKind) -> Result<Arc<DeviceContext>, ContextError> {
    let mut registry = REGISTRY
        .write()
        .unwrap_or_else(|poison| poison.into_inner());
    if registry.contains_key(&id) {
        return Err(ContextError::DuplicateContext { id });
    }
    let ctx = Arc::new(DeviceContext { id, kind });
    registry.insert(id, Arc::clone(&ctx));
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_always_present() {
        let ctx = context(DEFAULT_CONTEXT_ID).expect("default context");
        assert_eq!(ctx.id(), DEFAULT_CONTEXT_ID);
        assert_eq!(ctx.kind(), ContextKind::Cpu);
        assert!(!ctx.is_accelerated());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert_eq!(
            context(9_999).unwrap_err(),
            ContextError::UnknownContext { id: 9_999 }
        );
        assert!(!context_exists(9_999));
    }

    #[test]
    fn registration_round_trips_and_rejects_duplicates() {
        let id = 731;
        let ctx = register_context(id, ContextKind::Cpu).expect("fresh id");
        assert_eq!(ctx.id(), id);
        assert!(context_exists(id));
        assert_eq!(
            register_context(id, ContextKind::Cpu).unwrap_err(),
            ContextError::DuplicateContext { id }
        );
        assert_eq!(context(id).unwrap().id(), id);
    }
}
