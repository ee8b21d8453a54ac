//! Type → schema conversion.
//!
//! A [`Converter`] borrows a [`ClassSource`] and turns type descriptors, native
//! declarations, single doc tags or whole classes into a root [`SchemaFragment`].
//! Every public entry point starts a fresh [`DefinitionRegistry`] and merges the
//! definitions it collected into the returned root.

mod annotated;
mod class;
mod generic;
mod native;

use std::cell::Cell;

use indexmap::IndexMap;
use log::trace;

use crate::annotation;
use crate::config::Options;
use crate::docblock::Tag;
use crate::error::{Result, SchemaError};
use crate::model::{ClassInfo, ClassSource};
use crate::registry::{DefinitionKey, DefinitionRegistry};
use crate::schema::SchemaFragment;
use crate::types::{NativeType, TypeDescriptor};

/// Template parameter name → the concrete type bound to it.
pub type Bindings = IndexMap<String, TypeDescriptor>;

/// What `self`, `parent` and template names mean at the current point.
#[derive(Debug, Clone, Copy)]
struct Scope<'a> {
    class: Option<&'a ClassInfo>,
    bindings: &'a Bindings,
    /// Set while building a generic instantiation; `self` then refers to it.
    instance: Option<&'a DefinitionKey>,
}

impl<'a> Scope<'a> {
    fn new(class: Option<&'a ClassInfo>, bindings: &'a Bindings) -> Self {
        Self {
            class,
            bindings,
            instance: None,
        }
    }
}

pub struct Converter<'s> {
    source: &'s dyn ClassSource,
    options: Options,
    depth: Cell<usize>,
}

impl<'s> Converter<'s> {
    pub fn new(source: &'s dyn ClassSource) -> Self {
        Self::with_options(source, Options::default())
    }

    pub fn with_options(source: &'s dyn ClassSource, options: Options) -> Self {
        Self {
            source,
            options,
            depth: Cell::new(0),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Converts an already-parsed annotation type.
    pub fn convert_type(&self, ty: &TypeDescriptor, current_class: Option<&str>) -> Result<SchemaFragment> {
        self.convert_type_with_bindings(ty, current_class, &Bindings::new())
    }

    pub fn convert_type_with_bindings(
        &self,
        ty: &TypeDescriptor,
        current_class: Option<&str>,
        bindings: &Bindings,
    ) -> Result<SchemaFragment> {
        let class = self.context_class(current_class)?;
        self.run(|registry| self.annotated(ty, Scope::new(class, bindings), registry))
    }

    /// Parses `annotation` with the current class's template parameters in scope,
    /// then converts it.
    pub fn convert_annotation(&self, annotation: &str, current_class: Option<&str>) -> Result<SchemaFragment> {
        let templates = match self.context_class(current_class)? {
            Some(class) => self.class_doc(class)?.templates(),
            None => Vec::new(),
        };
        let ty = annotation::parse_type(annotation, &templates)?;
        self.convert_type(&ty, current_class)
    }

    /// Converts a natively declared type; `None` means undeclared.
    pub fn convert_native(&self, declared: Option<&NativeType>, current_class: Option<&str>) -> Result<SchemaFragment> {
        let class = self.context_class(current_class)?;
        let bindings = Bindings::new();
        self.run(|registry| self.native(declared, Scope::new(class, &bindings), registry))
    }

    /// A `$ref` to `name` with its definition (and everything it reaches) attached.
    pub fn convert_class(&self, name: &str) -> Result<SchemaFragment> {
        let class = self.lookup(name)?;
        self.run(|registry| self.class_ref(class, registry))
    }

    /// Converts one `@var` or `@property*` tag, applying the tag text as
    /// title/description and the access mode as `readOnly`/`writeOnly`.
    pub fn convert_tag(&self, tag: &Tag, current_class: Option<&str>) -> Result<SchemaFragment> {
        let class = self.context_class(current_class)?;
        let bindings = Bindings::new();
        self.run(|registry| self.tag_schema(tag, Scope::new(class, &bindings), registry))
    }

    fn run(&self, convert: impl FnOnce(&mut DefinitionRegistry) -> Result<SchemaFragment>) -> Result<SchemaFragment> {
        let mut registry = DefinitionRegistry::new(self.options.definitions_prefix.clone());
        self.depth.set(0);
        let mut root = convert(&mut registry)?;
        registry.merge_into(&mut root)?;
        Ok(root)
    }

    /// Runs `step` one level deeper, failing once `max_depth` is reached.
    fn descend<T>(&self, step: impl FnOnce() -> Result<T>) -> Result<T> {
        let current = self.depth.get();
        if current >= self.options.max_depth {
            return Err(SchemaError::TooDeep(self.options.max_depth));
        }
        self.depth.set(current + 1);
        let result = step();
        self.depth.set(current);
        result
    }

    fn context_class(&self, name: Option<&str>) -> Result<Option<&'s ClassInfo>> {
        name.map(|name| self.lookup(name)).transpose()
    }

    /// Looks up a fully-qualified name.
    fn lookup(&self, name: &str) -> Result<&'s ClassInfo> {
        let source: &'s dyn ClassSource = self.source;
        source
            .class(name)
            .ok_or_else(|| SchemaError::UnknownClass(name.trim_start_matches('\\').to_string()))
    }

    /// Resolves a class name as written in the current scope: a leading `\` makes it
    /// absolute, otherwise the current namespace is tried first.
    fn resolve_class(&self, written: &str, scope: Scope<'_>) -> Result<&'s ClassInfo> {
        if written.starts_with('\\') {
            return self.lookup(written);
        }
        if let Some(namespace) = scope.class.and_then(ClassInfo::namespace) {
            if let Ok(found) = self.lookup(&format!("{namespace}\\{written}")) {
                return Ok(found);
            }
        }
        self.lookup(written)
    }

    fn current_class<'a>(&self, keyword: &'static str, scope: Scope<'a>) -> Result<&'a ClassInfo> {
        scope.class.ok_or_else(|| SchemaError::MissingContext {
            keyword,
            reason: "there is no current class".to_string(),
        })
    }

    fn parent_class(&self, scope: Scope<'_>) -> Result<&'s ClassInfo> {
        let class = self.current_class("parent", scope)?;
        let Some(parent) = &class.parent else {
            return Err(SchemaError::MissingContext {
                keyword: "parent",
                reason: format!("`{}` has no parent class", class.name),
            });
        };
        self.lookup(parent)
    }

    /// `$ref` to the plain (non-generic) definition of `class`.
    fn class_ref(&self, class: &ClassInfo, registry: &mut DefinitionRegistry) -> Result<SchemaFragment> {
        trace!("referencing class `{}`", class.name);
        let key = DefinitionKey::for_class(&class.name);
        registry.lookup_or_build(&key, |registry| {
            let bindings = Bindings::new();
            self.build_class_like(class, Scope::new(Some(class), &bindings), registry)
        })
    }

    /// `self`, `static` and `$this`.
    fn self_ref(
        &self,
        keyword: &'static str,
        scope: Scope<'_>,
        registry: &mut DefinitionRegistry,
    ) -> Result<SchemaFragment> {
        let class = self.current_class(keyword, scope)?;
        match scope.instance {
            Some(key) => Ok(registry.reference(key)),
            None => self.class_ref(class, registry),
        }
    }
}
