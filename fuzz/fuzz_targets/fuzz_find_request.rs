#![no_main]
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

fn db() -> &'static mangolite::Database {
    static DB: OnceLock<mangolite::Database> = OnceLock::new();
    DB.get_or_init(|| {
        let db = mangolite::Database::new();
        let Ok(col) = db.create_collection("fuzz") else { return db };
        let _ = col.insert_json([
            r#"{"_id": "a", "n": 1, "s": "x", "arr": [1, 2, 3]}"#,
            r#"{"_id": "b", "n": 2.5, "s": null, "sub": {"k": true}}"#,
            r#"{"_id": "c", "arr": []}"#,
        ]);
        let _ = col.create_index(&["n"], None);
        let _ = col.create_index(&["s", "n"], None);
        db
    })
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // Any body either fails validation or runs to completion
        if let Err(e) = db().find("fuzz", s) {
            assert!(e.is_client_error(), "unexpected error: {e}");
        }
    }
});
