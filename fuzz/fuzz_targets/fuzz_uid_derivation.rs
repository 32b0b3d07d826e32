//! Fuzz target for identifier candidates.
//!
//! Arbitrary name pairs must never panic and must only ever produce ASCII
//! lower-case alphanumeric identifiers.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_uid_derivation -- -max_total_time=600

#![no_main]

use arbitrary::Arbitrary;
use ldapadmin_accounts::IdentifierDeriver;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct NamePair {
    given_name: String,
    surname: String,
}

fuzz_target!(|input: NamePair| {
    if input.given_name.len() > 1000 || input.surname.len() > 1000 {
        return;
    }

    let surname = IdentifierDeriver::normalize(&input.surname);
    let candidate = IdentifierDeriver::candidate(&input.given_name, &input.surname);

    assert!(candidate
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    assert!(candidate.ends_with(&surname));
    assert!(candidate.len() <= surname.len() + 1);

    // Normalizing twice changes nothing
    assert_eq!(IdentifierDeriver::normalize(&candidate), candidate);
});
