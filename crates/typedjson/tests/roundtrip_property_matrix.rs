use proptest::prelude::*;
use typedjson::{EncodeOptions, FlatValue, TypedJson, Value};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9f64).prop_map(Value::Float),
        "[a-z ]{0,8}".prop_map(Value::from),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::tuple),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::set),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(Value::dict),
        ]
    })
}

fn contains_object_tag(flat: &FlatValue) -> bool {
    match flat {
        FlatValue::Array(items) => items.iter().any(contains_object_tag),
        FlatValue::Object(map) => {
            map.contains_key(typedjson::tags::OBJECT) || map.values().any(contains_object_tag)
        }
        _ => false,
    }
}

proptest! {
    #[test]
    fn prop_flatten_restore_round_trip(v in value()) {
        let engine = TypedJson::new();
        let restored = engine.restore(&engine.flatten(&v)).unwrap();
        prop_assert_eq!(restored, v);
    }

    #[test]
    fn prop_shared_child_restores_shared(v in value()) {
        let engine = TypedJson::new();
        let shared = Value::list([v]);
        let outer = Value::tuple([shared.clone(), shared]);
        let restored = engine.restore(&engine.flatten(&outer)).unwrap();
        let tuple = restored.as_tuple().unwrap();
        prop_assert!(tuple.get(0).unwrap().ptr_eq(&tuple.get(1).unwrap()));
    }

    #[test]
    fn prop_lossy_output_has_no_object_tag(v in value()) {
        let engine = TypedJson::new();
        let flat = engine.flatten_with(&v, EncodeOptions::new().with_unpicklable(false));
        prop_assert!(!contains_object_tag(&flat));
    }

    #[test]
    fn prop_integer_text_round_trip(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let engine = TypedJson::new();
        let v = Value::tuple(items);
        let text = engine.encode(&v).unwrap();
        prop_assert_eq!(engine.decode(&text).unwrap(), v);
    }
}
