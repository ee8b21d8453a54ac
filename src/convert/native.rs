use log::trace;

use super::{Converter, Scope};
use crate::annotation::is_reserved_word;
use crate::error::{Result, SchemaError};
use crate::registry::DefinitionRegistry;
use crate::schema::{JsonType, SchemaFragment, TypeSet};
use crate::types::NativeType;

/// Builtin scalar names usable in a native declaration.
pub(crate) fn native_scalar(name: &str) -> Option<JsonType> {
    match name.to_ascii_lowercase().as_str() {
        "null" => Some(JsonType::Null),
        "bool" | "boolean" => Some(JsonType::Boolean),
        "int" | "integer" => Some(JsonType::Integer),
        "float" | "double" => Some(JsonType::Number),
        "string" => Some(JsonType::String),
        _ => None,
    }
}

impl Converter<'_> {
    pub(super) fn native(
        &self,
        declared: Option<&NativeType>,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        match declared {
            None => Ok(SchemaFragment::any()),
            Some(ty) => self.descend(|| self.native_step(ty, scope, registry)),
        }
    }

    fn native_step(
        &self,
        ty: &NativeType,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        trace!("native `{ty}`");
        match ty {
            NativeType::Named { name, nullable } => {
                let schema = self.native_named(name, scope, registry)?;
                Ok(if *nullable { schema.into_nullable() } else { schema })
            }
            NativeType::Union { members, nullable } => {
                let kinds: Option<Vec<JsonType>> = members
                    .iter()
                    .map(|member| match member {
                        NativeType::Named { name, nullable: false } => native_scalar(name),
                        _ => None,
                    })
                    .collect();
                if let Some(kinds) = kinds {
                    let null = nullable.then_some(JsonType::Null);
                    return Ok(SchemaFragment::of_type(TypeSet::from_kinds(null.into_iter().chain(kinds))));
                }
                let mut branches = members
                    .iter()
                    .map(|member| self.native(Some(member), scope, registry))
                    .collect::<Result<Vec<_>>>()?;
                if *nullable {
                    branches.push(SchemaFragment::of_type(JsonType::Null));
                }
                Ok(SchemaFragment::any_of(branches))
            }
            NativeType::Intersection { nullable: true, .. } => {
                Err(SchemaError::NullableIntersection(ty.to_string()))
            }
            NativeType::Intersection { members, .. } => {
                let branches = members
                    .iter()
                    .map(|member| self.native(Some(member), scope, registry))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SchemaFragment::all_of(branches))
            }
        }
    }

    fn native_named(&self, name: &str, scope: Scope<'_>, registry: &mut DefinitionRegistry) -> Result<SchemaFragment> {
        if let Some(kind) = native_scalar(name) {
            return Ok(SchemaFragment::of_type(kind));
        }
        match name.to_ascii_lowercase().as_str() {
            "mixed" => Ok(SchemaFragment::any()),
            "object" => Ok(SchemaFragment::open_object()),
            "array" | "iterable" => Ok(SchemaFragment::of_type(TypeSet::Many(vec![
                JsonType::Array,
                JsonType::Object,
            ]))),
            "self" => self.self_ref("self", scope, registry),
            "static" => self.self_ref("static", scope, registry),
            "parent" => self.class_ref(self.parent_class(scope)?, registry),
            word if is_reserved_word(word) => Err(SchemaError::UnsupportedType(name.to_string())),
            _ => {
                let class = self.resolve_class(name, scope)?;
                self.class_ref(class, registry)
            }
        }
    }
}
