use log::debug;

use super::native::native_scalar;
use super::{Converter, Scope};
use crate::annotation::TemplateParam;
use crate::docblock::{DocBlock, PropertyAccess, Tag};
use crate::error::{Result, SchemaError};
use crate::model::{ClassInfo, EnumInfo, FieldInfo};
use crate::registry::DefinitionRegistry;
use crate::schema::{AdditionalProperties, JsonType, SchemaFragment, TypeSet};

impl Converter<'_> {
    /// Builds the definition body for a class or enum. `scope` is the class's own
    /// scope: itself as the current class plus any generic bindings.
    pub(super) fn build_class_like(
        &self,
        class: &ClassInfo,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        let doc = self.class_doc(class)?;
        let mut schema = match &class.enumeration {
            Some(info) => build_enum(class, info)?,
            None => self.build_object(class, &doc, scope, registry)?,
        };
        schema.apply_title_and_description(&doc.full_text());
        if doc.is_deprecated() {
            schema.deprecated = Some(true);
        }
        Ok(schema)
    }

    pub(super) fn class_doc(&self, class: &ClassInfo) -> Result<DocBlock> {
        match &class.doc {
            None => Ok(DocBlock::default()),
            Some(text) => DocBlock::parse(text, &[]).map_err(|source| SchemaError::DocComment {
                owner: class.name.clone(),
                source,
            }),
        }
    }

    pub(super) fn class_templates(&self, class: &ClassInfo) -> Result<Vec<TemplateParam>> {
        Ok(self.class_doc(class)?.templates())
    }

    fn build_object(
        &self,
        class: &ClassInfo,
        doc: &DocBlock,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        debug!("assembling object schema for `{}`", class.name);
        let mut schema = SchemaFragment {
            required: Some(Vec::new()),
            ..SchemaFragment::of_type(JsonType::Object)
        };
        if class.is_final {
            schema.additional_properties = Some(AdditionalProperties::Allowed(false));
        }

        let templates = doc.templates();

        for field in class.public_fields() {
            let property = self.native_field(class, field, &templates, scope, registry)?;
            schema.set_property(field.name.clone(), property);
            schema.require(field.name.clone());
        }

        for tag in &doc.tags {
            if let Tag::Property { name, .. } = tag {
                let property = self.tag_schema(tag, scope, registry)?;
                schema.set_property(name.clone(), property);
            }
        }

        if let Some(required) = &mut schema.required {
            let mut seen = Vec::with_capacity(required.len());
            required.retain(|name| {
                let first = !seen.contains(name);
                if first {
                    seen.push(name.clone());
                }
                first
            });
        }
        Ok(schema)
    }

    fn native_field(
        &self,
        class: &ClassInfo,
        field: &FieldInfo,
        templates: &[TemplateParam],
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        let doc = match &field.doc {
            None => DocBlock::default(),
            Some(text) => DocBlock::parse(text, templates).map_err(|source| SchemaError::DocComment {
                owner: format!("{}::${}", class.name, field.name),
                source,
            })?,
        };

        let mut schema = match doc.var_tag() {
            Some(tag) => self.tag_schema(tag, scope, registry)?,
            None => self.native(field.declared.as_ref(), scope, registry)?,
        };
        if let Some(default) = &field.default {
            schema.default = Some(default.clone());
        }
        let summary = doc.summary.trim();
        if !summary.is_empty() {
            schema.description = Some(summary.to_string());
        }
        if doc.is_deprecated() {
            schema.deprecated = Some(true);
        }
        if doc.is_readonly() || field.readonly {
            schema.read_only = Some(true);
        }
        Ok(schema)
    }

    /// Schema for a `@var` or `@property*` tag, with the tag text applied.
    pub(super) fn tag_schema(
        &self,
        tag: &Tag,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        match tag {
            Tag::Var { ty, description, .. } => {
                let mut schema = self.annotated(ty, scope, registry)?;
                schema.apply_title_and_description(description);
                Ok(schema)
            }
            Tag::Property {
                access,
                ty,
                description,
                ..
            } => {
                let mut schema = self.annotated(ty, scope, registry)?;
                schema.apply_title_and_description(description);
                match access {
                    PropertyAccess::ReadOnly => schema.read_only = Some(true),
                    PropertyAccess::WriteOnly => schema.write_only = Some(true),
                    PropertyAccess::ReadWrite => {}
                }
                Ok(schema)
            }
            Tag::Template(param) => Err(SchemaError::UnsupportedType(format!("@template {}", param.name))),
            Tag::Deprecated => Err(SchemaError::UnsupportedType("@deprecated".into())),
            Tag::ReadOnly => Err(SchemaError::UnsupportedType("@readonly".into())),
        }
    }
}

fn build_enum(class: &ClassInfo, info: &EnumInfo) -> Result<SchemaFragment> {
    let malformed = |reason: String| SchemaError::MalformedEnum {
        name: class.name.clone(),
        reason,
    };
    let Some(backing) = &info.backing else {
        return Err(malformed("it is not a backed enum".into()));
    };
    let kind = native_scalar(backing)
        .filter(|kind| matches!(kind, JsonType::Integer | JsonType::String))
        .ok_or_else(|| malformed(format!("unsupported backing type `{backing}`")))?;
    let values = info
        .cases
        .iter()
        .map(|case| {
            let value = case
                .value
                .as_ref()
                .ok_or_else(|| malformed(format!("case `{}` has no backing value", case.name)))?;
            let matches_backing = match kind {
                JsonType::Integer => value.is_i64() || value.is_u64(),
                _ => value.is_string(),
            };
            if !matches_backing {
                return Err(malformed(format!(
                    "case `{}` value `{value}` does not match backing type `{backing}`",
                    case.name
                )));
            }
            Ok(value.clone())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SchemaFragment {
        kind: Some(TypeSet::Single(kind)),
        enumeration: Some(values),
        ..SchemaFragment::default()
    })
}
