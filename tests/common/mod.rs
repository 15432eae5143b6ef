#![allow(dead_code)]
use bson::Bson;
use mangolite::Database;
use mangolite::config::FindConfig;
use mangolite::find::FindResult;

pub const USERS: &str = "users";

/// Declared in this order; tie-break tests depend on it.
pub const INDEXES: &[&[&str]] = &[
    &["user_id"],
    &["name.last", "name.first"],
    &["age"],
    &["location.state", "location.city", "location.address.street", "location.address.number"],
    &["company", "manager"],
    &["manager"],
    &["favorites"],
    &["favorites.3"],
    &["twitter"],
];

pub const DOCS: &[&str] = &[
    r#"{"_id": "71562648-6acb-42bc-a182-df6b1f005b09", "user_id": 0, "name": {"first": "Stephanie", "last": "Kirkland"}, "age": 48, "location": {"state": "Nevada", "city": "Ronco", "address": {"street": "Evergreen Avenue", "number": 347}}, "company": "Dreamia", "manager": false, "favorites": ["Ruby", "C", "Python"], "twitter": "@cactus"}"#,
    r#"{"_id": "12a2800c-4fe2-45a8-8d78-c084f4e242a9", "user_id": 1, "name": {"first": "Abbott", "last": "Watson"}, "age": 30, "location": {"state": "Virginia", "city": "Westmoreland", "address": {"street": "Dahlgreen Place", "number": 914}}, "company": "Talkola", "manager": true, "favorites": ["Ruby", "Python", "C", {"Versions": {"Alpha": "Beta"}}], "twitter": "@apple"}"#,
    r#"{"_id": "48ca0455-8bd0-473f-9ae2-459e42e3edd1", "user_id": 2, "name": {"first": "Shelly", "last": "Ewing"}, "age": 52, "location": {"state": "New Mexico", "city": "Thomasville", "address": {"street": "Bristol Street", "number": 707}}, "company": "Zialactic", "manager": true}"#,
    r#"{"_id": "0461444c-0d6f-4d4c-9e2e-a38df6e00b83", "user_id": 3, "name": {"first": "Madelyn", "last": "Soto"}, "age": 79, "location": {"state": "Utah", "city": "Albany", "address": {"street": "Stillwell Avenue", "number": 166}}, "company": "Tasmania", "manager": true}"#,
    r#"{"_id": "8e1c90c0-ac18-4832-8081-40d14325bde0", "user_id": 4, "name": {"first": "Nona", "last": "Horton"}, "age": 61, "location": {"state": "Michigan", "city": "Mapletown", "address": {"street": "Lafayette Avenue", "number": 329}}, "company": "Digirang", "manager": false, "twitter": "@banjo"}"#,
    r#"{"_id": "a33d5457-741a-4dce-a217-3eab28b24e3e", "user_id": 5, "name": {"first": "Sheppard", "last": "Bauer"}, "age": 65, "location": {"state": "Ohio", "city": "Lindcove", "address": {"street": "Cropsey Avenue", "number": 465}}, "company": "Sportan", "manager": false, "favorites": ["C++", "Ruby", "Python", "Lisp"]}"#,
    r#"{"_id": "6c0afcf1-e57e-421d-a03d-0c0717ebf843", "user_id": 6, "name": {"first": "Kendra", "last": "Hunter"}, "age": 45, "location": {"state": "Illinois", "city": "Craig", "address": {"street": "Seaview Avenue", "number": 643}}, "company": "Pharmex", "manager": true, "favorites": ["Ruby", "Python", "Lisp", "C"]}"#,
    r#"{"_id": "e8ea29fd-0a78-4d1c-a31f-b5a82c0c73b6", "user_id": 7, "name": {"first": "Jordan", "last": "Mccoy"}, "age": 32, "location": {"state": "Montana", "city": "Longbranch", "address": {"street": "Dwight Street", "number": 107}}, "company": "Kengen", "manager": true}"#,
    r#"{"_id": "2ee4ee71-6c3e-4c9a-9f0b-4b8c2e6b5b71", "user_id": 8, "name": {"first": "Nelson", "last": "Vance"}, "age": 70, "location": {"state": "Oregon", "city": "Sunwest", "address": {"street": "Columbia Place", "number": 252}}, "company": "Comvex", "manager": false, "favorites": ["Lisp", "Scala", "Python", "C"]}"#,
    r#"{"_id": "5b61abc1-a3d3-4092-b9d7-ced90e675536", "user_id": 9, "name": {"first": "Sanford", "last": "Vaughn"}, "age": 22, "location": {"state": "Texas", "city": "Vivian", "address": {"street": "Irving Avenue", "number": 855}}, "company": "Sultraxin"}"#,
    r#"{"_id": "3ab9a9ae-6d2d-4f34-a23a-ed9f6fc06b5a", "user_id": 10, "name": {"first": "Kirsten", "last": "Rich"}, "age": 41, "location": {"state": "Kansas", "city": "Tilden", "address": {"street": "Truxton Street", "number": 520}}, "company": "Emoltra"}"#,
    r#"{"_id": "9a3e3c3a-7f0e-4e56-9a2b-6d1c0f4f8f11", "user_id": 11, "name": {"first": "Mathis", "last": "Hernandez"}, "age": 75, "location": {"state": "Maine", "city": "Avalon", "address": {"street": "Oceanview Avenue", "number": 218}}, "company": "Comvey"}"#,
    r#"{"_id": "b1f8a3d6-2c54-4f7a-8e2d-1a9c3b5d7e12", "user_id": 12, "name": {"first": "Alexandra", "last": "Nash"}, "age": 58, "location": {"state": "Hawaii", "city": "Chloride", "address": {"street": "Ovington Court", "number": 418}}, "company": "Bugsall"}"#,
    r#"{"_id": "c7d2e9f0-4b3a-4e8c-b5a1-0f2d4c6e8a13", "user_id": 13, "name": {"first": "Whitley", "last": "Harper"}, "age": 78, "location": {"state": "Idaho", "city": "Sultana", "address": {"street": "Butler Street", "number": 721}}, "company": "Zialactic", "manager": true, "twitter": "@dune"}"#,
    r#"{"_id": "d4e5f6a7-8b9c-4d0e-9f1a-2b3c4d5e6f14", "user_id": 14, "name": {"first": "Mcdowell", "last": "Powers"}, "age": 67, "location": {"state": "Montana", "city": "Longbranch", "address": {"street": "Kent Avenue", "number": 109}}, "company": "Zolarex", "manager": false}"#,
];

/// The user fixture loaded into `users` with every index in [`INDEXES`] declared.
pub fn users_db() -> Database {
    users_db_with(FindConfig::default())
}

pub fn users_db_with(config: FindConfig) -> Database {
    let db = Database::with_config(config);
    let col = db.create_collection(USERS).unwrap();
    col.insert_json(DOCS.iter().copied()).unwrap();
    for fields in INDEXES {
        db.create_index(USERS, fields, None).unwrap();
    }
    db
}

pub fn user_ids(result: &FindResult) -> Vec<i64> {
    result
        .values_of("user_id")
        .into_iter()
        .map(|v| match v {
            Bson::Int32(i) => i64::from(*i),
            Bson::Int64(i) => *i,
            other => panic!("user_id is not an integer: {other}"),
        })
        .collect()
}

pub fn find_ids(db: &Database, body: &str) -> Vec<i64> {
    user_ids(&db.find(USERS, body).unwrap())
}
