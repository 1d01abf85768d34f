#![forbid(clippy::unwrap_used)]

//! A minimal actor plugin exercising both dispatch paths the server
//! supports: a scalar-only method and a DTO round-trip. Built as a
//! `cdylib` against `arpc-plugin` and loadable via `system.register_actor`
//! or a manifest entry.

use arpc_plugin::{export_actor, Actor, ActorFault, Dto, DtoRegistry, MethodDescriptor, TypeTag};
use serde_json::{Map, Value};

/// The DTO type used by `modify`, carrying one integer attribute.
pub struct Item {
    pub attr: i64,
}

impl Dto for Item {
    fn type_name() -> &'static str {
        "Item"
    }

    fn to_mapping(&self) -> Map<String, Value> {
        let mut mapping = Map::new();
        mapping.insert("attr".into(), Value::from(self.attr));
        mapping
    }

    fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, String> {
        let attr = mapping
            .get("attr")
            .and_then(Value::as_i64)
            .ok_or_else(|| "missing integer field `attr`".to_string())?;
        Ok(Item { attr })
    }
}

pub struct GreeterActor {
    registry: DtoRegistry,
}

impl Default for GreeterActor {
    fn default() -> Self {
        Self {
            registry: DtoRegistry::new().register::<Item>(),
        }
    }
}

impl Actor for GreeterActor {
    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("add_two_ints")
                .doc("Adds two integers and returns the sum.")
                .param("x", TypeTag::Int)
                .param("y", TypeTag::Int)
                .returns(TypeTag::Int),
            MethodDescriptor::new("modify")
                .doc("Replaces an Item's attr with n and returns the Item.")
                .param("obj", TypeTag::Dto("Item".to_string()))
                .param("n", TypeTag::Int)
                .returns(TypeTag::Dto("Item".to_string())),
        ]
    }

    fn dto_registry(&self) -> &DtoRegistry {
        &self.registry
    }

    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ActorFault> {
        match method {
            "add_two_ints" => {
                let x = args.first().and_then(Value::as_i64).ok_or_else(|| ActorFault::new("x must be an int"))?;
                let y = args.get(1).and_then(Value::as_i64).ok_or_else(|| ActorFault::new("y must be an int"))?;
                Ok(Value::from(x + y))
            }
            "modify" => {
                let mapping = args
                    .first()
                    .and_then(Value::as_object)
                    .ok_or_else(|| ActorFault::new("obj must be a mapping"))?;
                let mut item = Item::from_mapping(mapping).map_err(ActorFault::new)?;
                let n = args.get(1).and_then(Value::as_i64).ok_or_else(|| ActorFault::new("n must be an int"))?;
                item.attr = n;
                Ok(Value::Object(item.to_mapping()))
            }
            other => Err(ActorFault::new(format!("unknown method `{other}`"))),
        }
    }
}

export_actor!(GreeterActor::default());
