#![allow(dead_code)]

mod samples;

pub use samples::*;

use typedjson::{ReprHandler, TypedJson, Value};

/// A private configuration with every sample type registered.
pub fn engine() -> TypedJson {
    let engine = TypedJson::new();
    engine.register_type::<Thing>();
    engine.register_type::<ThingWithSlots>();
    engine.register_type::<ListSubclass>();
    engine.register_type::<SetSubclass>();
    engine.register_type::<DictSubclass>();
    engine.register_type::<ThingWithState>();
    engine.register_type::<BrokenReprThing>();
    engine.register_handler_for::<Version>(ReprHandler::<Version>::new());
    engine.register_handler_for::<Opaque>(OpaqueHandler);
    engine
}

/// Current value of attribute `name` on an object value.
pub fn attr(value: &Value, name: &str) -> Value {
    let obj = value.as_object().expect("object value");
    let attrs = obj.borrow().attributes();
    attrs
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
        .unwrap_or_else(|| panic!("no attribute `{name}` on {}", obj.type_path()))
}

pub fn set_attr(value: &Value, name: &str, to: impl Into<Value>) {
    let obj = value.as_object().expect("object value");
    obj.borrow_mut().set_attribute(name, to.into());
}

pub fn thing(name: &str) -> Value {
    Value::Object(Thing::new(name))
}
