//! Fuzz target for partial update payloads.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_changes_parsing -- -max_total_time=600

#![no_main]

use ldapadmin_directory::account::{Account, AccountChanges};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok(changes) = AccountChanges::from_json(&value) {
        let mut account = Account::new("fuzz", "Fuzz", "Target");
        changes.apply_to(&mut account);

        for (attr, requested) in changes.iter() {
            assert_eq!(account.get(attr), requested);
        }
    }
});
