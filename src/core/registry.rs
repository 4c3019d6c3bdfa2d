// Copyright (c) 2026
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![deny(missing_docs)]

//! Tracepoint registry: canonical name -> enable bit.
//!
//! Reads (the `submit` hot path) and writes (the session reacting to
//! `enable`/`disable` commands) must never contend with each other. The
//! enable bit is an `AtomicBool` behind an `Arc`, so once a tracepoint is
//! registered, toggling or reading its bit takes no lock at all; the
//! `RwLock` around the map is only ever touched by `register` (a write,
//! short critical section) and by the handful of reads needed to fetch the
//! `Arc` for a name that's new to the caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::core::name::{self, NameError};

/// Registration outcome, mirroring the spec's "0 on success, negative on
/// failure" convention.
pub const REGISTER_OK: i32 = 0;
/// Returned by `register` when the name fails canonicalization.
pub const REGISTER_INVALID: i32 = -1;

/// Shared tracepoint registry.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Arc<AtomicBool>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }

    /// Register a tracepoint. Idempotent: re-registering an existing name
    /// is a no-op success and never resets its enable bit.
    ///
    /// Returns [`REGISTER_OK`] or [`REGISTER_INVALID`].
    pub fn register(&self, name: &str) -> i32 {
        let canonical = match name::canonicalize(name) {
            Ok(c) => c,
            Err(NameError) => return REGISTER_INVALID,
        };

        // Fast path: already present, avoid the write lock entirely.
        if self.entries.read().unwrap().contains_key(&canonical) {
            return REGISTER_OK;
        }

        self.entries
            .write()
            .unwrap()
            .entry(canonical)
            .or_insert_with(|| Arc::new(AtomicBool::new(false)));

        REGISTER_OK
    }

    /// Look up a tracepoint's enable bit. Unknown or invalid names report
    /// `false` — never an error.
    pub fn is_enabled(&self, name: &str) -> bool {
        let canonical = match name::canonicalize(name) {
            Ok(c) => c,
            Err(NameError) => return false,
        };
        self.bit_for(&canonical).map(|b| b.load(Ordering::Acquire)).unwrap_or(false)
    }

    /// Look up the enable bit for an already-canonicalized name, for
    /// internal callers (the submit path) that canonicalize once and reuse
    /// the result for both the enable check and the enqueue.
    pub fn is_enabled_canonical(&self, canonical: &str) -> bool {
        self.bit_for(canonical).map(|b| b.load(Ordering::Acquire)).unwrap_or(false)
    }

    /// Set the enable bit for an already-canonicalized name. Unregistered
    /// names are ignored — a consumer cannot enable a tracepoint the host
    /// never registered.
    pub fn set_enabled_canonical(&self, canonical: &str, on: bool) {
        if let Some(bit) = self.bit_for(canonical) {
            bit.store(on, Ordering::Release);
        }
    }

    /// Disable every currently-registered tracepoint. Called when a
    /// consumer session ends, so the next consumer starts from a clean
    /// slate.
    pub fn clear_all_enabled(&self) {
        let entries = self.entries.read().unwrap();
        for bit in entries.values() {
            bit.store(false, Ordering::Release);
        }
    }

    /// Number of registered tracepoints, for metrics.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the registry currently has no tracepoints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bit_for(&self, canonical: &str) -> Option<Arc<AtomicBool>> {
        self.entries.read().unwrap().get(canonical).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_enable_is_visible_case_insensitively() {
        let reg = Registry::new();
        assert_eq!(reg.register("SysStat"), REGISTER_OK);
        reg.set_enabled_canonical("sysstat", true);
        assert!(reg.is_enabled("SYSSTAT"));
        assert!(reg.is_enabled("sysstat"));
    }

    #[test]
    fn register_is_idempotent_and_preserves_enable_bit() {
        let reg = Registry::new();
        assert_eq!(reg.register("temp"), REGISTER_OK);
        reg.set_enabled_canonical("temp", true);
        assert_eq!(reg.register("temp"), REGISTER_OK);
        assert!(reg.is_enabled("temp"));
    }

    #[test]
    fn invalid_name_rejected_closure() {
        let reg = Registry::new();
        assert_eq!(reg.register("Überprüfung"), REGISTER_INVALID);
        assert!(!reg.is_enabled("Überprüfung"));
    }

    #[test]
    fn unknown_tracepoint_is_disabled() {
        let reg = Registry::new();
        assert!(!reg.is_enabled("never_registered"));
    }

    #[test]
    fn disable_respected_until_enable() {
        let reg = Registry::new();
        assert_eq!(reg.register("m"), REGISTER_OK);
        reg.set_enabled_canonical("m", true);
        assert!(reg.is_enabled("m"));
        reg.set_enabled_canonical("m", false);
        assert!(!reg.is_enabled("m"));
    }

    #[test]
    fn clear_all_enabled_resets_every_bit() {
        let reg = Registry::new();
        reg.register("a");
        reg.register("b");
        reg.set_enabled_canonical("a", true);
        reg.set_enabled_canonical("b", true);
        reg.clear_all_enabled();
        assert!(!reg.is_enabled("a"));
        assert!(!reg.is_enabled("b"));
    }
}
