// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.

//! Lightweight hooks for observing Level-2 operations without pulling a
//! logging framework into the hot path.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};

use crate::element::Dtype;

/// Metadata about a completed Level-2 operation.
#[derive(Clone, Debug)]
pub struct Blas2Event {
    pub op_name: &'static str,
    pub dtype: Dtype,
    pub backend: &'static str,
    pub rows: usize,
    pub cols: usize,
}

/// Observer callback invoked after an operation completes.
pub type Blas2Observer = Arc<dyn Fn(&Blas2Event) + Send + Sync + 'static>;

static BLAS2_OBSERVER: OnceLock<RwLock<Option<Blas2Observer>>> = OnceLock::new();

thread_local! {
    static IN_OBSERVER_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// Install (or clear) the global operation observer.
///
/// Returns the previously installed observer, if any.
pub fn set_blas2_observer(observer: Option<Blas2Observer>) -> Option<Blas2Observer> {
    let lock = BLAS2_OBSERVER.get_or_init(|| RwLock::new(None));
    let mut slot = lock.write().unwrap_or_else(|poison| poison.into_inner());
    std::mem::replace(&mut *slot, observer)
}

/// Emit an operation event to the currently installed observer.
///
/// No-op unless an observer has been registered. Panics inside the observer
/// are contained; observer callbacks that themselves trigger operations do
/// not recurse.
pub(crate) fn emit_blas2_event(event: &Blas2Event) {
    let Some(lock) = BLAS2_OBSERVER.get() else {
        return;
    };
    let observer = {
        let slot = lock.read().unwrap_or_else(|poison| poison.into_inner());
        slot.clone()
    };
    let Some(observer) = observer else {
        return;
    };
    IN_OBSERVER_CALLBACK.with(|flag| {
        if flag.get() {
            return;
        }
        flag.set(true);
        let _ = catch_unwind(AssertUnwindSafe(|| observer(event)));
        flag.set(false);
    });
}
