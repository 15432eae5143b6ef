#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // Selector::from_json should reject or accept, never panic
        if let Ok(sel) = mangolite::query::Selector::from_json(s) {
            let _ = sel.to_json();
        }
    }
});
