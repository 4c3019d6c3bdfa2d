// Copyright (c) 2026
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use proptest::prelude::*;

use tracebus::core::name::{canonicalize, NAME_MAX};

proptest! {
    #[test]
    fn idempotent_on_any_successful_canonicalization(s in ".{1,64}") {
        if let Ok(once) = canonicalize(&s) {
            let twice = canonicalize(&once).expect("canonical form is already valid");
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn case_insensitive_over_printable_ascii(s in "[ -~]{1,40}") {
        let lower = canonicalize(&s).expect("printable ASCII always canonicalizes");
        let upper = canonicalize(&s.to_uppercase()).expect("uppercasing stays printable ASCII");
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn result_never_exceeds_name_max(s in "[ -~]{0,200}") {
        if let Ok(canonical) = canonicalize(&s) {
            prop_assert!(canonical.len() <= NAME_MAX);
        }
    }

    #[test]
    fn a_control_byte_anywhere_is_a_hard_rejection(
        prefix in "[ -~]{0,16}",
        bad_byte in 0u8..0x20,
        suffix in "[ -~]{0,16}",
    ) {
        // Control bytes (0x00..0x1F) are always valid lone UTF-8 code points,
        // so this string construction never needs a lossy fallback.
        let mut s = prefix;
        s.push(bad_byte as char);
        s.push_str(&suffix);
        prop_assert!(canonicalize(&s).is_err());
    }
}
