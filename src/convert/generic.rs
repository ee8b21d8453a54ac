use log::debug;

use super::{Bindings, Converter, Scope};
use crate::annotation::is_reserved_word;
use crate::error::{Result, SchemaError};
use crate::model::ClassInfo;
use crate::registry::{DefinitionKey, DefinitionRegistry};
use crate::schema::SchemaFragment;
use crate::types::TypeDescriptor;

impl Converter<'_> {
    /// `Base<A, B>`: binds the base class's template parameters to the (concrete)
    /// arguments and builds the instantiation under its own key.
    pub(super) fn instantiate(
        &self,
        base: &str,
        args: &[TypeDescriptor],
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        if is_reserved_word(base) {
            let written = TypeDescriptor::Generic {
                base: base.to_string(),
                args: args.to_vec(),
            };
            return Err(SchemaError::UnsupportedType(written.to_string()));
        }

        let class = self.resolve_class(base, scope)?;
        let params = self.class_templates(class)?;
        if params.len() != args.len() {
            return Err(SchemaError::GenericArityMismatch {
                class: class.name.clone(),
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut bindings = Bindings::new();
        let mut names = Vec::with_capacity(args.len());
        for (param, arg) in params.iter().zip(args) {
            let concrete = self.concrete_argument(class, arg, scope)?;
            names.push(argument_key(&concrete));
            bindings.insert(param.name.clone(), concrete);
        }

        let key = DefinitionKey::for_class(&class.name).instantiate(&names);
        debug!("instantiating `{key}`");
        registry.lookup_or_build(&key, |registry| {
            let scope = Scope {
                class: Some(class),
                bindings: &bindings,
                instance: Some(&key),
            };
            self.build_class_like(class, scope, registry)
        })
    }

    /// Reduces a generic argument to something that can be bound: an absolute class
    /// name or a scalar type. Template names are looked up in the enclosing bindings;
    /// `self` inside an instantiation binds that instantiation.
    fn concrete_argument(&self, base: &ClassInfo, arg: &TypeDescriptor, scope: Scope<'_>) -> Result<TypeDescriptor> {
        let class_named = |class: &ClassInfo| TypeDescriptor::Class(format!("\\{}", class.name));
        match arg {
            TypeDescriptor::Class(name) => Ok(class_named(self.resolve_class(name, scope)?)),
            TypeDescriptor::SelfType | TypeDescriptor::Static => {
                let current = self.current_class("self", scope)?;
                Ok(match scope.instance {
                    Some(_) => TypeDescriptor::Generic {
                        base: format!("\\{}", current.name),
                        args: scope.bindings.values().cloned().collect(),
                    },
                    None => class_named(current),
                })
            }
            TypeDescriptor::Template { name, .. } => scope.bindings.get(name).cloned().ok_or_else(|| {
                SchemaError::NonConcreteGenericArgument {
                    class: base.name.clone(),
                    argument: name.clone(),
                }
            }),
            other if matches!(
                other,
                TypeDescriptor::Bool | TypeDescriptor::Int | TypeDescriptor::Float | TypeDescriptor::String
            ) =>
            {
                Ok(other.clone())
            }
            other => Err(SchemaError::NonConcreteGenericArgument {
                class: base.name.clone(),
                argument: other.to_string(),
            }),
        }
    }
}

/// How a bound argument appears inside an instantiation key.
fn argument_key(concrete: &TypeDescriptor) -> String {
    match concrete {
        TypeDescriptor::Class(name) => DefinitionKey::for_class(name).to_string(),
        TypeDescriptor::Generic { base, args } => {
            let args: Vec<String> = args.iter().map(argument_key).collect();
            DefinitionKey::for_class(base).instantiate(&args).to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassModel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn model() -> ClassModel {
        ClassModel::from_json_value(
            "inline",
            json!({"classes": [
                {
                    "name": "Api\\Page",
                    "doc": "/**\n * @template T\n */",
                    "fields": [
                        {"name": "items", "type": "array", "doc": "/** @var list<T> */"},
                        {"name": "next", "type": "?self"}
                    ]
                },
                {
                    "name": "Api\\Pair",
                    "doc": "/**\n * @template K\n * @template V\n */",
                    "fields": [
                        {"name": "key", "doc": "/** @var K */"},
                        {"name": "value", "doc": "/** @var Page<V> */"}
                    ]
                },
                {"name": "Api\\Tag", "final": true, "fields": [{"name": "label", "type": "string"}]}
            ]}),
        )
        .unwrap()
    }

    #[test]
    fn scalar_arguments_bind_directly() {
        let model = model();
        let schema = Converter::new(&model).convert_annotation(r"\Api\Page<int>", None).unwrap();
        assert_eq!(
            schema.to_json().unwrap(),
            json!({
                "$ref": "#/definitions/Api.Page<int>",
                "definitions": {
                    "Api.Page<int>": {
                        "type": "object",
                        "required": ["items", "next"],
                        "properties": {
                            "items": {"type": "array", "items": {"type": "integer"}},
                            "next": {"anyOf": [{"type": "null"}, {"$ref": "#/definitions/Api.Page<int>"}]}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn plain_reference_to_generic_class_needs_bindings() {
        let model = model();
        let err = Converter::new(&model).convert_class(r"Api\Page").unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedTemplate(name) if name == "T"));
    }

    #[test]
    fn bindings_flow_into_nested_instantiations() {
        let model = model();
        let schema = Converter::new(&model)
            .convert_annotation("Pair<string, Tag>", Some(r"Api\Tag"))
            .unwrap();
        assert_eq!(schema.reference.as_deref(), Some("#/definitions/Api.Pair<string,Api.Tag>"));
        let definitions = schema.definitions.unwrap();
        let keys: Vec<_> = definitions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Api.Pair<string,Api.Tag>", "Api.Page<Api.Tag>", "Api.Tag"]);
        assert_eq!(
            definitions["Api.Pair<string,Api.Tag>"].to_json().unwrap()["properties"]["value"],
            json!({"$ref": "#/definitions/Api.Page<Api.Tag>"})
        );
    }

    #[test]
    fn self_argument_inside_an_instantiation_binds_the_instance() {
        let model = ClassModel::from_json_value(
            "inline",
            json!({"classes": [
                {
                    "name": "Api\\Node",
                    "doc": "/**\n * @template T\n */",
                    "fields": [
                        {"name": "value", "doc": "/** @var T */"},
                        {"name": "link", "doc": "/** @var Box<self> */"}
                    ]
                },
                {
                    "name": "Api\\Box",
                    "doc": "/**\n * @template B\n */",
                    "fields": [{"name": "content", "doc": "/** @var B */"}]
                }
            ]}),
        )
        .unwrap();
        let schema = Converter::new(&model).convert_annotation(r"\Api\Node<int>", None).unwrap();
        let json = schema.to_json().unwrap();
        assert_eq!(
            json["definitions"]["Api.Node<int>"]["properties"]["link"],
            json!({"$ref": "#/definitions/Api.Box<Api.Node<int>>"})
        );
        assert_eq!(
            json["definitions"]["Api.Box<Api.Node<int>>"]["properties"]["content"],
            json!({"$ref": "#/definitions/Api.Node<int>"})
        );
        assert_eq!(json["definitions"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn arity_must_match() {
        let model = model();
        let err = Converter::new(&model)
            .convert_annotation(r"\Api\Pair<int>", None)
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::GenericArityMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn arguments_must_be_concrete() {
        let model = model();
        let err = Converter::new(&model)
            .convert_annotation(r"\Api\Page<int|string>", None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::NonConcreteGenericArgument { ref argument, .. } if argument == "int|string"));
    }

    #[test]
    fn reserved_bases_are_unsupported() {
        let model = model();
        let err = Converter::new(&model).convert_annotation("object<int>", None).unwrap_err();
        assert_eq!(err.to_string(), "`object<int>` cannot be converted to JSON Schema");
    }
}
