use std::any::Any;
use std::fmt;
use std::str::FromStr;

use serde_json::Map;
use typedjson::{
    Attributes, Container, Dict, FlatValue, Handler, List, ObjectRef, Pickler, Reflect, ReprError,
    Set, TypePath, Unpickler, Value,
};

macro_rules! type_path {
    ($ty:ident, $path:literal) => {
        impl TypePath for $ty {
            fn type_path() -> &'static str {
                $path
            }
        }
    };
}

macro_rules! reflect_basics {
    () => {
        fn reflect_type_path(&self) -> &'static str {
            <Self as TypePath>::type_path()
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

/// Two declared fields plus whatever else gets assigned.
#[derive(Default)]
pub struct Thing {
    pub name: String,
    pub child: Value,
    pub extra: Attributes,
}

type_path!(Thing, "samples.Thing");

impl Thing {
    pub fn new(name: &str) -> ObjectRef {
        ObjectRef::new(Thing {
            name: name.to_owned(),
            ..Default::default()
        })
    }
}

impl Reflect for Thing {
    reflect_basics!();

    fn attributes(&self) -> Vec<(String, Value)> {
        let mut attrs = vec![
            ("name".to_owned(), Value::from(self.name.as_str())),
            ("child".to_owned(), self.child.clone()),
        ];
        attrs.extend(self.extra.to_vec());
        attrs
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        match name {
            "name" => self.name = value.as_str().unwrap_or_default().to_owned(),
            "child" => self.child = value,
            _ => self.extra.set(name, value),
        }
    }

    fn repr(&self) -> Result<String, ReprError> {
        Ok(format!("Thing({:?})", self.name))
    }
}

/// Fixed layout: exactly `a` and `b`, nothing else is kept.
#[derive(Default)]
pub struct ThingWithSlots {
    pub a: Value,
    pub b: Value,
}

type_path!(ThingWithSlots, "samples.ThingWithSlots");

impl Reflect for ThingWithSlots {
    reflect_basics!();

    fn attributes(&self) -> Vec<(String, Value)> {
        vec![("a".to_owned(), self.a.clone()), ("b".to_owned(), self.b.clone())]
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        match name {
            "a" => self.a = value,
            "b" => self.b = value,
            _ => {}
        }
    }
}

#[derive(Default)]
pub struct ListSubclass {
    pub items: List,
    pub extra: Attributes,
}

type_path!(ListSubclass, "samples.ListSubclass");

impl Reflect for ListSubclass {
    reflect_basics!();

    fn attributes(&self) -> Vec<(String, Value)> {
        self.extra.to_vec()
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.extra.set(name, value);
    }

    fn container(&self) -> Option<Container> {
        Some(Container::Sequence(self.items.clone()))
    }
}

#[derive(Default)]
pub struct SetSubclass {
    pub members: Set,
    pub extra: Attributes,
}

type_path!(SetSubclass, "samples.SetSubclass");

impl Reflect for SetSubclass {
    reflect_basics!();

    fn attributes(&self) -> Vec<(String, Value)> {
        self.extra.to_vec()
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.extra.set(name, value);
    }

    fn container(&self) -> Option<Container> {
        Some(Container::Set(self.members.clone()))
    }
}

/// A mapping whose `name` is fixed at construction.
pub struct DictSubclass {
    pub entries: Dict,
    pub name: String,
}

type_path!(DictSubclass, "samples.DictSubclass");

impl Default for DictSubclass {
    fn default() -> Self {
        Self {
            entries: Dict::new(),
            name: "Test".to_owned(),
        }
    }
}

impl Reflect for DictSubclass {
    reflect_basics!();

    fn container(&self) -> Option<Container> {
        Some(Container::Mapping(self.entries.clone()))
    }
}

/// Captures its state as a mapping instead of exposing attributes.
#[derive(Default)]
pub struct ThingWithState {
    pub nom: String,
    pub identity: Value,
}

type_path!(ThingWithState, "samples.ThingWithState");

impl Reflect for ThingWithState {
    reflect_basics!();

    fn attributes(&self) -> Vec<(String, Value)> {
        vec![("never".to_owned(), Value::from("flattened"))]
    }

    fn state(&self) -> Option<Value> {
        Some(Value::dict([
            ("nom", Value::from(self.nom.as_str())),
            ("identity", self.identity.clone()),
        ]))
    }

    fn set_state(&mut self, state: Value) {
        let Some(state) = state.as_dict() else {
            return;
        };
        self.nom = state
            .get("nom")
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        self.identity = state.get("identity").unwrap_or_default();
    }
}

#[derive(Default)]
pub struct BrokenReprThing {
    pub name: String,
}

type_path!(BrokenReprThing, "samples.BrokenReprThing");

impl Reflect for BrokenReprThing {
    reflect_basics!();

    fn attributes(&self) -> Vec<(String, Value)> {
        vec![("name".to_owned(), Value::from(self.name.as_str()))]
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        if name == "name" {
            self.name = value.as_str().unwrap_or_default().to_owned();
        }
    }

    fn repr(&self) -> Result<String, ReprError> {
        Err(ReprError::new(Self::type_path(), "broken on purpose"))
    }
}

/// Round-trips through its text form with `ReprHandler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

type_path!(Version, "samples.Version");

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').ok_or_else(|| format!("no dot in {s:?}"))?;
        Ok(Version {
            major: major.parse().map_err(|e| format!("{e}"))?,
            minor: minor.parse().map_err(|e| format!("{e}"))?,
        })
    }
}

impl Reflect for Version {
    reflect_basics!();
}

/// Exposes nothing through `Reflect`; only `OpaqueHandler` can move it.
pub struct Opaque {
    pub label: String,
    pub payload: Value,
}

type_path!(Opaque, "samples.Opaque");

impl Reflect for Opaque {
    reflect_basics!();
}

pub struct OpaqueHandler;

impl Handler for OpaqueHandler {
    fn flatten(
        &self,
        obj: &ObjectRef,
        mut data: Map<String, FlatValue>,
        pickler: &mut Pickler,
    ) -> FlatValue {
        let Some((label, payload)) = obj
            .downcast_ref::<Opaque>()
            .map(|o| (o.label.clone(), o.payload.clone()))
        else {
            return FlatValue::Null;
        };
        data.insert("label".to_owned(), FlatValue::String(label));
        let payload = pickler.flatten_child(&payload);
        data.insert("payload".to_owned(), payload);
        FlatValue::Object(data)
    }

    fn restore(
        &self,
        data: &Map<String, FlatValue>,
        unpickler: &mut Unpickler,
    ) -> typedjson::Result<Value> {
        let label = data
            .get("label")
            .and_then(FlatValue::as_str)
            .unwrap_or_default()
            .to_owned();
        let payload = match data.get("payload") {
            Some(flat) => unpickler.restore_child(flat)?,
            None => Value::Null,
        };
        Ok(Value::object(Opaque { label, payload }))
    }
}
