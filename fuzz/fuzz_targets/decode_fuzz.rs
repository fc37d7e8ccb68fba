//! Fuzz test for the criteria wire decoder
//!
//! Feeds arbitrary bytes to every decode entry point and checks that:
//! - decoding never panics
//! - anything that decodes re-encodes and decodes to an equal value
//! - validation errors always carry at least one violation
//!
//! Run with: cargo +nightly fuzz run decode_fuzz -- -max_total_time=60

#![no_main]

use filterspec_core::{Criteria, Filter, PageableCriteria, QueryError, WireFormat};
use libfuzzer_sys::fuzz_target;

fn check<T>(data: &[u8])
where
    T: WireFormat + PartialEq + std::fmt::Debug,
{
    match T::decode(data) {
        Ok(value) => {
            let again = T::decode(&value.encode());
            assert_eq!(again.as_ref(), Ok(&value), "Re-encoded value must decode unchanged");
        }
        Err(QueryError::Validation(errors)) => {
            assert!(!errors.is_empty(), "Validation error without violations");
        }
        Err(_) => {}
    }
}

fuzz_target!(|data: &[u8]| {
    check::<Filter>(data);
    check::<Criteria>(data);
    check::<PageableCriteria>(data);
});
