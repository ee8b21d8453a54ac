//! Named definitions collected during one conversion.
//!
//! Each key moves ABSENT → BUILDING → COMPLETE. A reference to a key that is still
//! BUILDING gets its `$ref` straight away, which is what stops a self-referencing
//! class from recursing forever.

use std::fmt;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::SchemaError;
use crate::schema::SchemaFragment;

/// Canonical identity of a class (or generic instantiation), used both as the
/// registry key and as the `$ref` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionKey(String);

impl DefinitionKey {
    /// `\App\Model\Person` and `App::Model::Person` both become `App.Model.Person`.
    pub fn for_class(qualified: &str) -> Self {
        let trimmed = qualified.trim_start_matches('\\').trim_start_matches("::");
        DefinitionKey(trimmed.replace("::", ".").replace('\\', "."))
    }

    /// `Base<Arg1,Arg2>`
    pub fn instantiate(&self, args: &[String]) -> Self {
        DefinitionKey(format!("{}<{}>", self.0, args.join(",")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Building,
    Complete,
}

#[derive(Debug)]
enum Entry {
    Building,
    Complete(SchemaFragment),
}

#[derive(Debug)]
pub struct DefinitionRegistry {
    prefix: String,
    entries: IndexMap<DefinitionKey, Entry>,
}

impl DefinitionRegistry {
    /// `prefix` is prepended to keys to form `$ref` values, e.g. `#/definitions/`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: IndexMap::new(),
        }
    }

    pub fn state(&self, key: &DefinitionKey) -> EntryState {
        match self.entries.get(key) {
            None => EntryState::Absent,
            Some(Entry::Building) => EntryState::Building,
            Some(Entry::Complete(_)) => EntryState::Complete,
        }
    }

    pub fn reference(&self, key: &DefinitionKey) -> SchemaFragment {
        SchemaFragment::reference(format!("{}{key}", self.prefix))
    }

    /// Returns a `$ref` to `key`, running `build` first if the key has never been
    /// seen. A failed build leaves no trace of the key behind.
    pub fn lookup_or_build<E, F>(&mut self, key: &DefinitionKey, build: F) -> Result<SchemaFragment, E>
    where
        F: FnOnce(&mut Self) -> Result<SchemaFragment, E>,
    {
        match self.state(key) {
            EntryState::Complete => return Ok(self.reference(key)),
            EntryState::Building => {
                trace!("`{key}` refers back to itself while building");
                return Ok(self.reference(key));
            }
            EntryState::Absent => {}
        }

        debug!("building definition `{key}`");
        self.entries.insert(key.clone(), Entry::Building);
        match build(self) {
            Ok(schema) => {
                self.entries.insert(key.clone(), Entry::Complete(schema));
                debug!("finished definition `{key}`");
                Ok(self.reference(key))
            }
            Err(err) => {
                debug!("dropping definition `{key}` after a failed build");
                self.entries.shift_remove(key);
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves every definition into `root.definitions`, after any it already has.
    pub fn merge_into(self, root: &mut SchemaFragment) -> Result<(), SchemaError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let mut merged = root.definitions.take().unwrap_or_default();
        for (key, entry) in self.entries {
            match entry {
                Entry::Complete(schema) => {
                    merged.insert(key.0, schema);
                }
                Entry::Building => return Err(SchemaError::IncompleteRegistry(key.0)),
            }
        }
        root.definitions = Some(merged);
        Ok(())
    }
}
