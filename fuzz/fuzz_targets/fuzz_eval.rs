#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(selector) = mangolite::query::Selector::from_json(s) {
            // Build a tiny set of docs with mixed shapes to exercise eval paths
            let docs = [
                bson::doc!{"a": 1, "b": 2, "name": "x"},
                bson::doc!{"a": 10, "b": -5, "name": "y", "nested": {"z": 3}},
                bson::doc!{"active": true, "tags": ["x", 1, null], "a": null},
                bson::doc!{},
            ];
            for d in &docs {
                let _ = mangolite::query::matches(d, &selector);
            }
        }
    }
});
