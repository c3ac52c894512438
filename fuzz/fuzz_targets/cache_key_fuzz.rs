//! Fuzz target for cache key canonicalization.
//!
//! Treats the input as a JSON object of query parameters and checks that
//! key building never panics and that the key does not depend on the order
//! parameters were inserted in.
//!
//! Run with: cargo +nightly fuzz run cache_key_fuzz -- -max_total_time=60

#![no_main]

use domus_core::QueryParams;
use domus_query::{base_of, build_key};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let pairs: Vec<(String, Value)> = map.into_iter().collect();

    let forward: QueryParams = pairs.iter().cloned().collect();
    let backward: QueryParams = pairs.iter().rev().cloned().collect();

    let key = build_key("fuzz:list", &forward);
    assert_eq!(key, build_key("fuzz:list", &backward));
    assert_eq!(base_of(&key), "fuzz:list");
});
