//! Fuzz test for operator and filter type token parsing
//!
//! Any token that parses must render back to a canonical token that parses
//! to the same value.
//!
//! Run with: cargo +nightly fuzz run operator_fuzz -- -max_total_time=60

#![no_main]

use filterspec_core::{BasicOperator, DateTimeOperator, FilterType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(op) = token.parse::<BasicOperator>() {
        assert_eq!(op.as_str().parse::<BasicOperator>(), Ok(op));
        assert_eq!(op.as_str(), token.trim().to_lowercase());
    }
    if let Ok(op) = token.parse::<DateTimeOperator>() {
        assert_eq!(op.as_str().parse::<DateTimeOperator>(), Ok(op));
    }
    if let Ok(kind) = token.parse::<FilterType>() {
        assert_eq!(kind.as_str().parse::<FilterType>(), Ok(kind));
    }
});
