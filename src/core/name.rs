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

//! Tracepoint name canonicalization.
//!
//! One canonicalization path is used everywhere a name crosses a boundary:
//! `register`, `is_enabled`, `submit`, and inbound consumer commands. There
//! is no other place names are normalized, so two names are equal iff their
//! canonical forms are byte-equal.

use thiserror::Error;

/// Maximum length, in bytes, of a canonical tracepoint name. Excess bytes
/// of an otherwise-valid name are truncated, not rejected.
pub const NAME_MAX: usize = 32;

/// A name failed canonicalization.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("tracepoint name is not valid printable ASCII")]
pub struct NameError;

/// Alias matching the spec's `Invalid` error kind.
pub type Invalid = NameError;

/// Canonicalize a tracepoint name.
///
/// - Every byte must be in `0x20..=0x7E` (printable ASCII); any other byte
///   is a hard rejection, not a sanitization target.
/// - Uppercase ASCII `A..Z` folds to lowercase; all other printable bytes
///   pass through unchanged.
/// - The folded form is truncated to at most [`NAME_MAX`] bytes.
/// - An empty result (either the input was empty, or truncation produced
///   nothing, which cannot actually happen since truncation only shortens)
///   is rejected.
pub fn canonicalize(name: &str) -> Result<String, NameError> {
    if name.as_bytes().iter().any(|&b| !(0x20..=0x7E).contains(&b)) {
        return Err(NameError);
    }

    let folded: String = name
        .bytes()
        .map(|b| if b.is_ascii_uppercase() { b.to_ascii_lowercase() } else { b })
        .map(|b| b as char)
        .collect();

    let truncated: String = folded.bytes().take(NAME_MAX).map(|b| b as char).collect();

    if truncated.is_empty() {
        return Err(NameError);
    }

    Ok(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_keeps_ascii() {
        assert_eq!(canonicalize("SysStat").unwrap(), "sysstat");
        assert_eq!(canonicalize("system_status").unwrap(), "system_status");
    }

    #[test]
    fn rejects_non_ascii() {
        assert_eq!(canonicalize("Überprüfung"), Err(NameError));
    }

    #[test]
    fn rejects_control_bytes() {
        assert_eq!(canonicalize("bad\nname"), Err(NameError));
        assert_eq!(canonicalize("bad\0name"), Err(NameError));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(canonicalize(""), Err(NameError));
    }

    #[test]
    fn truncates_to_name_max() {
        let long = "a".repeat(NAME_MAX + 10);
        let got = canonicalize(&long).unwrap();
        assert_eq!(got.len(), NAME_MAX);
        assert_eq!(got, "a".repeat(NAME_MAX));
    }

    #[test]
    fn idempotent_on_success() {
        for s in ["Temp", "SYSSTAT", "thermal_sensor_0", "mixedCase-42"] {
            let once = canonicalize(s).unwrap();
            let twice = canonicalize(&once).unwrap();
            assert_eq!(once, twice);
        }
    }
}
