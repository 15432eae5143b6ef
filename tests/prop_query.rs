use bson::{Bson, doc};
use mangolite::Database;
use mangolite::query::{Selector, compare_values, matches};
use proptest::prelude::*;
use std::cmp::Ordering;

fn scalar() -> impl Strategy<Value = Bson> {
    prop_oneof![
        Just(Bson::Null),
        any::<bool>().prop_map(Bson::Boolean),
        (-1_000_000i32..1_000_000).prop_map(Bson::Int32),
        (-1_000_000i64..1_000_000).prop_map(Bson::Int64),
        // no NaN or infinities
        (-1.0e6f64..1.0e6f64).prop_map(Bson::Double),
        // integers and doubles past 2^53, where f64 no longer holds every integer
        (-(1i64 << 60)..(1i64 << 60)).prop_map(Bson::Int64),
        (-(1i64 << 60)..(1i64 << 60)).prop_map(|i| Bson::Double(i as f64)),
        ((1i64 << 53) - 4..(1i64 << 53) + 4).prop_map(Bson::Int64),
        ((1i64 << 53) - 4..(1i64 << 53) + 4).prop_map(|i| Bson::Double(i as f64)),
        "[a-d]{0,3}".prop_map(Bson::String),
    ]
}

fn value() -> impl Strategy<Value = Bson> {
    scalar().prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..3).prop_map(Bson::Array),
            proptest::collection::vec(("[xy]", inner), 0..3).prop_map(|kvs| {
                Bson::Document(kvs.into_iter().collect())
            }),
        ]
    })
}

fn selector(v: serde_json::Value) -> Selector {
    Selector::from_json(&v.to_string()).unwrap()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_ordering_is_antisymmetric(a in value(), b in value()) {
        prop_assert_eq!(compare_values(&a, &b), compare_values(&b, &a).reverse());
        prop_assert_eq!(compare_values(&a, &a), Ordering::Equal);
    }

    #[test]
    fn prop_ordering_is_transitive(a in scalar(), b in scalar(), c in scalar()) {
        let mut v = [a, b, c];
        v.sort_by(compare_values);
        prop_assert_ne!(compare_values(&v[0], &v[2]), Ordering::Greater);
    }

    // on a present field, $gt and $lte split every value
    #[test]
    fn prop_gt_and_lte_are_complementary(x in value(), j in scalar()) {
        let doc = doc! {"x": x};
        let operand = mangolite::utils::json::bson_to_json(&j);
        let gt = matches(&doc, &selector(serde_json::json!({"x": {"$gt": operand.clone()}})));
        let lte = matches(&doc, &selector(serde_json::json!({"x": {"$lte": operand}})));
        prop_assert_eq!(gt, !lte);
    }

    #[test]
    fn prop_missing_matches_only_negations(j in scalar()) {
        let doc = doc! {"y": 1};
        let operand = mangolite::utils::json::bson_to_json(&j);
        for op in ["$eq", "$gt", "$gte", "$lt", "$lte"] {
            let sel = selector(serde_json::json!({"x": {op: operand.clone()}}));
            prop_assert!(!matches(&doc, &sel));
        }
        let ne_sel = selector(serde_json::json!({"x": {"$ne": operand.clone()}}));
        prop_assert!(matches(&doc, &ne_sel));
        let nin_sel = selector(serde_json::json!({"x": {"$nin": [operand]}}));
        prop_assert!(matches(&doc, &nin_sel));
    }

    #[test]
    fn prop_limit_returns_a_prefix(ns in proptest::collection::vec(-50i32..50, 0..40), limit in 0usize..45, indexed in any::<bool>()) {
        let db = Database::new();
        let col = db.create_collection("p").unwrap();
        for (i, n) in ns.iter().enumerate() {
            col.insert_document(mangolite::document::Document::new(doc! {"_id": format!("{i:03}"), "n": *n}).unwrap());
        }
        if indexed {
            db.create_index("p", &["n"], None).unwrap();
        }
        let full = db.find("p", r#"{"selector": {"n": {"$gte": -10}}, "sort": ["n"], "limit": 100}"#).unwrap();
        let part = db
            .find("p", &format!(r#"{{"selector": {{"n": {{"$gte": -10}}}}, "sort": ["n"], "limit": {limit}}}"#))
            .unwrap();
        let expected: Vec<_> = full.docs.iter().take(limit).cloned().collect();
        prop_assert_eq!(&part.docs, &expected);
        // results are sorted and every one matches
        for w in full.docs.windows(2) {
            prop_assert!(w[0].get_i32("n").unwrap() <= w[1].get_i32("n").unwrap());
        }
        prop_assert_eq!(full.docs.len(), ns.iter().filter(|n| **n >= -10).count());
        let again = db.find("p", r#"{"selector": {"n": {"$gte": -10}}, "sort": ["n"], "limit": 100}"#).unwrap();
        prop_assert_eq!(full.docs, again.docs);
    }
}
