//! The crate-level functions share one process-wide configuration, so this
//! file keeps everything in a single test.

mod common;

use common::*;
use serde_json::json;
use typedjson::{CodecFailure, CodecModule, EncodeOptions, ReprHandler, TypedJson, Value};

#[test]
fn global_configuration_flow() {
    typedjson::register_type::<Thing>();
    typedjson::register_handler("samples.Version", ReprHandler::<Version>::new());

    let text = typedjson::encode(&thing("A name")).unwrap();
    assert_eq!(text, r#"{"tj/object":"samples.Thing","name":"A name","child":null}"#);
    let decoded = typedjson::decode(&text).unwrap();
    assert_eq!(attr(&decoded, "name"), Value::from("A name"));

    let lossy = typedjson::encode_with(
        &thing("A name"),
        EncodeOptions::new().with_unpicklable(false),
    )
    .unwrap();
    assert_eq!(lossy, r#"{"name":"A name","child":null}"#);

    let flat = typedjson::flatten(&Value::object(Version { major: 2, minor: 5 }));
    assert_eq!(flat, json!({"tj/object": "samples.Version", "tj/repr": "2.5"}));
    assert!(typedjson::restore(&flat).unwrap().as_object().unwrap().is::<Version>());
    assert_eq!(
        typedjson::flatten_with(&Value::tuple([1]), EncodeOptions::new().with_unpicklable(false)),
        json!([1])
    );

    // Backend management goes through the same configuration.
    TypedJson::global().backends().register_module(
        CodecModule::new("shout")
            .with_encoder("dump", |v: &serde_json::Value| Ok(v.to_string().to_uppercase()))
            .with_decoder("load", |s: &str| {
                serde_json::from_str(&s.to_lowercase()).map_err(|e| CodecFailure::new("ShoutError", e))
            })
            .with_error_kind("ShoutError"),
    );
    assert!(!typedjson::load_backend("shout", "dump", "missing", "ShoutError"));
    assert!(typedjson::set_preferred_backend("shout").is_err());

    assert!(typedjson::load_backend("shout", "dump", "load", "ShoutError"));
    typedjson::set_preferred_backend("shout").unwrap();
    assert_eq!(typedjson::encode(&Value::list(["hello"])).unwrap(), r#"["HELLO"]"#);
    assert_eq!(typedjson::decode(r#"["HELLO"]"#).unwrap(), Value::list(["hello"]));

    typedjson::remove_backend("shout");
    typedjson::remove_backend("shout");
    assert_eq!(typedjson::encode(&Value::list(["hello"])).unwrap(), r#"["hello"]"#);
}
