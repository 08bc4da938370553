//! Per-type field metadata used by the form decoder.
//!
//! A [`Schema`] maps every key a type accepts to the index path of the field it lands in.
//! Embedded fields are flattened into their parent's key space while being described, nested
//! structures are only referenced and resolved on demand, which keeps recursive types finite.

use crate::Decode;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

/// Collects the fields of a type, see [`Decode::describe`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    path: Vec<usize>,
    fields: HashMap<String, Entry>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Registers the leaf field at `index` under `key`
    pub fn value(&mut self, index: usize, key: &str, required: bool) {
        let path = self.path_to(index);
        self.insert(key, Entry::Value { path }, required);
    }

    /// Flattens the fields of the embedded structure at `index` into the current key space
    pub fn embed<T: Decode + ?Sized>(&mut self, index: usize) {
        self.path.push(index);
        T::describe(self);
        self.path.pop();
    }

    /// Registers the structure at `index`, whose fields are addressed as `key.field`
    pub fn nested<T: Decode + 'static>(&mut self, index: usize, key: &str) {
        let path = self.path_to(index);
        self.insert(key, Entry::Nested { path, schema: SchemaRef::of::<T>() }, false);
    }

    pub(crate) fn build(self) -> Schema {
        Schema { fields: self.fields, required: self.required }
    }

    fn path_to(&self, index: usize) -> Box<[usize]> {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(index);
        path.into_boxed_slice()
    }

    fn insert(&mut self, key: &str, entry: Entry, required: bool) {
        // a shallower field shadows a deeper one, otherwise the first declared wins
        if let Some(existing) = self.fields.get(key)
            && existing.path().len() <= entry.path().len()
        {
            return;
        }
        // the replaced field's requirement goes with it
        self.required.retain(|k| k != key);
        if required {
            self.required.push(key.to_owned());
        }
        self.fields.insert(key.to_owned(), entry);
    }
}

/// The decoded field metadata of one type.
#[derive(Debug)]
pub struct Schema {
    fields: HashMap<String, Entry>,
    required: Vec<String>,
}

impl Schema {
    pub(crate) fn get(&self, key: &str) -> Option<&Entry> {
        self.fields.get(key)
    }

    /// Keys that must be present, in declaration order
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Number of keys, nested structures counting once
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Value { path: Box<[usize]> },
    Nested { path: Box<[usize]>, schema: SchemaRef },
}

impl Entry {
    pub(crate) fn path(&self) -> &[usize] {
        match self {
            Entry::Value { path } | Entry::Nested { path, .. } => path,
        }
    }
}

/// A lazily built schema.
#[derive(Clone, Copy)]
pub(crate) struct SchemaRef {
    type_id: TypeId,
    type_name: &'static str,
    describe: fn(&mut SchemaBuilder),
}

impl SchemaRef {
    pub(crate) fn of<T: Decode + ?Sized + 'static>() -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: std::any::type_name::<T>(), describe: T::describe }
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn build(&self) -> Schema {
        let mut builder = SchemaBuilder::default();
        (self.describe)(&mut builder);
        builder.build()
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRef").field("type_name", &self.type_name).finish_non_exhaustive()
    }
}
