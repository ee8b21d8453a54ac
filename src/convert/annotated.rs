use log::trace;
use serde_json::Number;

use super::{Converter, Scope};
use crate::error::{Result, SchemaError};
use crate::registry::DefinitionRegistry;
use crate::schema::{AdditionalProperties, JsonType, SchemaFragment, TypeSet};
use crate::types::{Refinement, ShapeEntry, TypeDescriptor};

pub(crate) const LOWERCASE_PATTERN: &str = "^[^A-Z]*$";
pub(crate) const NUMERIC_PATTERN: &str = r"^-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?$";

impl Converter<'_> {
    pub(super) fn annotated(
        &self,
        ty: &TypeDescriptor,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        self.descend(|| self.annotated_step(ty, scope, registry))
    }

    fn annotated_step(
        &self,
        ty: &TypeDescriptor,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        trace!("annotation `{ty}`");
        let schema = match ty {
            TypeDescriptor::Mixed => SchemaFragment::any(),
            TypeDescriptor::Null
            | TypeDescriptor::Bool
            | TypeDescriptor::Int
            | TypeDescriptor::Float
            | TypeDescriptor::String => match ty.scalar_kind() {
                Some(kind) => SchemaFragment::of_type(kind),
                None => SchemaFragment::any(),
            },
            TypeDescriptor::Scalar => SchemaFragment::of_type(TypeSet::Many(vec![
                JsonType::String,
                JsonType::Integer,
                JsonType::Number,
                JsonType::Boolean,
            ])),
            TypeDescriptor::ArrayKey => {
                SchemaFragment::of_type(TypeSet::Many(vec![JsonType::String, JsonType::Integer]))
            }
            TypeDescriptor::Object => SchemaFragment::open_object(),
            TypeDescriptor::Literal(literal) => SchemaFragment::constant(literal.to_json()),
            TypeDescriptor::Refined(refinement) => refined(*refinement),
            TypeDescriptor::IntRange { min, max } => SchemaFragment {
                minimum: min.map(Number::from),
                maximum: max.map(Number::from),
                ..SchemaFragment::of_type(JsonType::Integer)
            },

            TypeDescriptor::Nullable(inner) => self.annotated(inner, scope, registry)?.into_nullable(),
            TypeDescriptor::Union(members) => self.union(members, scope, registry)?,
            TypeDescriptor::Intersection(members) => {
                let branches = members
                    .iter()
                    .map(|member| self.annotated(member, scope, registry))
                    .collect::<Result<Vec<_>>>()?;
                SchemaFragment::all_of(branches)
            }

            TypeDescriptor::Generic { base, args } => self.instantiate(base, args, scope, registry)?,
            TypeDescriptor::Template { name, bound } => match (scope.bindings.get(name), bound) {
                (Some(bound_to), _) => self.annotated(bound_to, scope, registry)?,
                (None, Some(bound)) => self.annotated(bound, scope, registry)?,
                (None, None) => return Err(SchemaError::UnresolvedTemplate(name.clone())),
            },

            TypeDescriptor::List { item, non_empty } => SchemaFragment {
                items: Some(Box::new(self.annotated(item, scope, registry)?)),
                min_items: non_empty.then_some(1),
                ..SchemaFragment::of_type(JsonType::Array)
            },
            TypeDescriptor::Collection { key, value } => {
                let string_keyed = matches!(key.as_deref(), Some(TypeDescriptor::String));
                match value {
                    None => SchemaFragment::of_type(TypeSet::Many(vec![JsonType::Array, JsonType::Object])),
                    Some(value) if string_keyed => {
                        let value = self.annotated(value, scope, registry)?;
                        SchemaFragment {
                            additional_properties: Some(AdditionalProperties::Schema(Box::new(value))),
                            ..SchemaFragment::of_type(JsonType::Object)
                        }
                    }
                    Some(value) => {
                        let value = self.annotated(value, scope, registry)?;
                        SchemaFragment {
                            items: Some(Box::new(value.clone())),
                            additional_properties: Some(AdditionalProperties::Schema(Box::new(value))),
                            ..SchemaFragment::of_type(TypeSet::Many(vec![JsonType::Array, JsonType::Object]))
                        }
                    }
                }
            }
            TypeDescriptor::Shape(entries) => self.shape(entries, scope, registry)?,

            TypeDescriptor::Class(name) => {
                let class = self.resolve_class(name, scope)?;
                self.class_ref(class, registry)?
            }
            TypeDescriptor::SelfType => self.self_ref("self", scope, registry)?,
            TypeDescriptor::Static => self.self_ref("static", scope, registry)?,
            TypeDescriptor::This => self.self_ref("$this", scope, registry)?,
            TypeDescriptor::Parent => self.class_ref(self.parent_class(scope)?, registry)?,

            TypeDescriptor::Void
            | TypeDescriptor::Never
            | TypeDescriptor::Callable
            | TypeDescriptor::Resource
            | TypeDescriptor::Iterable
            | TypeDescriptor::Expression(_) => return Err(SchemaError::UnsupportedType(ty.to_string())),
        };
        Ok(schema)
    }

    /// All-scalar unions collapse into one `type` set, `null` first; anything else
    /// becomes `anyOf` in source order.
    fn union(
        &self,
        members: &[TypeDescriptor],
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        let kinds: Option<Vec<JsonType>> = members.iter().map(TypeDescriptor::scalar_kind).collect();
        if let Some(kinds) = kinds {
            let set = TypeSet::from_kinds(kinds);
            let set = if set.kinds().contains(&JsonType::Null) {
                set.with_null_first()
            } else {
                set
            };
            return Ok(SchemaFragment::of_type(set));
        }
        let branches = members
            .iter()
            .map(|member| self.annotated(member, scope, registry))
            .collect::<Result<Vec<_>>>()?;
        Ok(SchemaFragment::any_of(branches))
    }

    fn shape(
        &self,
        entries: &[ShapeEntry],
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        let mut schema = SchemaFragment::open_object();
        for entry in entries {
            let property = self.annotated(&entry.ty, scope, registry)?;
            schema.set_property(entry.key.clone(), property);
            if !entry.optional {
                schema.require(entry.key.clone());
            }
        }
        Ok(schema)
    }
}

fn refined(refinement: Refinement) -> SchemaFragment {
    let string = SchemaFragment::of_type(JsonType::String);
    match refinement {
        Refinement::PositiveInt => SchemaFragment {
            exclusive_minimum: Some(0.into()),
            ..SchemaFragment::of_type(JsonType::Integer)
        },
        Refinement::NegativeInt => SchemaFragment {
            exclusive_maximum: Some(0.into()),
            ..SchemaFragment::of_type(JsonType::Integer)
        },
        Refinement::NonEmptyString => SchemaFragment {
            min_length: Some(1),
            ..string
        },
        Refinement::LowercaseString => SchemaFragment {
            pattern: Some(LOWERCASE_PATTERN.to_string()),
            ..string
        },
        Refinement::NonEmptyLowercaseString => SchemaFragment {
            min_length: Some(1),
            pattern: Some(LOWERCASE_PATTERN.to_string()),
            ..string
        },
        Refinement::NumericString => SchemaFragment {
            pattern: Some(NUMERIC_PATTERN.to_string()),
            ..string
        },
        Refinement::Numeric => SchemaFragment {
            pattern: Some(NUMERIC_PATTERN.to_string()),
            ..SchemaFragment::of_type(TypeSet::Many(vec![
                JsonType::Number,
                JsonType::Integer,
                JsonType::String,
            ]))
        },
    }
}
