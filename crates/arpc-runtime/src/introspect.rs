use std::collections::BTreeMap;

use arpc_core::method::{ActorInfo, MethodInfo, Param};
use arpc_plugin::Actor;

/// Everything wrong with a candidate actor's declared method table,
/// collected rather than failing on the first problem, so a plugin author
/// sees every issue in one registration attempt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub problems: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.problems.join("; ")
    }
}

/// Derives an [`ActorInfo`] from a loaded actor instance and validates it
/// (§4.3): every `TypeTag::Dto` parameter or result must name a type
/// registered in the actor's [`arpc_plugin::DtoRegistry`].
///
/// Registration is refused (an error returned) unless the resulting
/// [`ValidationReport`] is empty.
pub fn introspect(
    name: &str,
    module_path: &str,
    module_id: &str,
    actor: &dyn Actor,
) -> Result<ActorInfo, ValidationReport> {
    let mut report = ValidationReport::default();
    let registry = actor.dto_registry();
    let mut methods = BTreeMap::new();

    for descriptor in actor.methods() {
        for (param_name, tag) in &descriptor.params {
            if tag.is_dto() && !registry.contains(tag.name()) {
                report.problems.push(format!(
                    "method `{}` parameter `{}` declares unregistered DTO type `{}`",
                    descriptor.name,
                    param_name,
                    tag.name()
                ));
            }
        }
        if descriptor.result_tag.is_dto() && !registry.contains(descriptor.result_tag.name()) {
            report.problems.push(format!(
                "method `{}` result declares unregistered DTO type `{}`",
                descriptor.name,
                descriptor.result_tag.name()
            ));
        }

        let params = descriptor
            .params
            .iter()
            .map(|(name, tag)| Param {
                name: (*name).to_string(),
                tag: tag.clone(),
            })
            .collect();
        methods.insert(
            descriptor.name.to_string(),
            MethodInfo {
                doc: descriptor.doc.to_string(),
                params,
                result_tag: descriptor.result_tag,
            },
        );
    }

    if !report.is_empty() {
        return Err(report);
    }

    Ok(ActorInfo {
        name: name.to_string(),
        module_path: module_path.to_string(),
        module_id: module_id.to_string(),
        methods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpc_plugin::{ActorFault, DtoRegistry, MethodDescriptor, TypeTag};
    use serde_json::Value;

    struct Stub {
        registry: DtoRegistry,
    }

    impl Actor for Stub {
        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![MethodDescriptor::new("add_two_ints")
                .param("x", TypeTag::Int)
                .param("y", TypeTag::Int)
                .returns(TypeTag::Int)]
        }

        fn dto_registry(&self) -> &DtoRegistry {
            &self.registry
        }

        fn call(&self, _method: &str, _args: Vec<Value>) -> Result<Value, ActorFault> {
            unimplemented!()
        }
    }

    struct StubWithUnregisteredDto {
        registry: DtoRegistry,
    }

    impl Actor for StubWithUnregisteredDto {
        fn methods(&self) -> Vec<MethodDescriptor> {
            vec![MethodDescriptor::new("modify")
                .param("obj", TypeTag::Dto("Item".to_string()))
                .returns(TypeTag::Dto("Item".to_string()))]
        }

        fn dto_registry(&self) -> &DtoRegistry {
            &self.registry
        }

        fn call(&self, _method: &str, _args: Vec<Value>) -> Result<Value, ActorFault> {
            unimplemented!()
        }
    }

    #[test]
    fn introspects_a_well_formed_actor() {
        let actor = Stub {
            registry: DtoRegistry::new(),
        };
        let info = introspect("greeter", "/actors/greeter.so", "mod-1", &actor).expect("valid");
        assert_eq!(info.name, "greeter");
        let method = info.method("add_two_ints").expect("present");
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.result_tag, TypeTag::Int);
    }

    #[test]
    fn refuses_registration_for_unregistered_dto_types() {
        let actor = StubWithUnregisteredDto {
            registry: DtoRegistry::new(),
        };
        let report =
            introspect("greeter", "/actors/greeter.so", "mod-1", &actor).expect_err("invalid");
        assert_eq!(report.problems.len(), 2);
    }
}
