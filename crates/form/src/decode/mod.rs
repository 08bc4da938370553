//! Decoding flat form values into typed structures.
//!
//! The submitted form is a [`FormValues`] multimap. Types opt in through [`Decode`], usually
//! generated by `#[derive(Form)]`, which describes the keys the type accepts and assigns values
//! to a field by index path. Leaf fields are parsed with [`FormValue`].

mod decoder;
mod schema;
mod value;

pub use decoder::FieldDecoder;
pub use schema::Schema;
pub use schema::SchemaBuilder;
pub use value::FormValue;

use crate::BoxError;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// A structure that can be populated from form values.
pub trait Decode {
    /// Upload ceiling for multipart bodies decoded into this type, overriding the policy default.
    const MAX_UPLOAD_SIZE: Option<u64> = None;

    /// Registers every decodable field, in declaration order.
    fn describe(schema: &mut SchemaBuilder);

    /// Writes `values` into the field at `path`, as registered by [`describe`](Decode::describe).
    fn assign(&mut self, path: &[usize], values: &[String]) -> Result<(), BoxError>;
}

impl<T: Decode + Default> Decode for Option<T> {
    const MAX_UPLOAD_SIZE: Option<u64> = T::MAX_UPLOAD_SIZE;

    fn describe(schema: &mut SchemaBuilder) {
        T::describe(schema);
    }

    fn assign(&mut self, path: &[usize], values: &[String]) -> Result<(), BoxError> {
        self.get_or_insert_with(T::default).assign(path, values)
    }
}

impl<T: Decode + ?Sized> Decode for Box<T> {
    const MAX_UPLOAD_SIZE: Option<u64> = T::MAX_UPLOAD_SIZE;

    fn describe(schema: &mut SchemaBuilder) {
        T::describe(schema);
    }

    fn assign(&mut self, path: &[usize], values: &[String]) -> Result<(), BoxError> {
        (**self).assign(path, values)
    }
}

/// Assigns a leaf field, leaving it untouched when no usable value was submitted.
pub fn assign_value<T: FormValue>(slot: &mut T, values: &[String]) -> Result<(), BoxError> {
    if let Some(value) = T::from_values(values)? {
        *slot = value;
    }
    Ok(())
}

/// Error for a path that does not lead to a field, only reachable through a broken `Decode` impl.
pub fn unknown_path(path: &[usize]) -> BoxError {
    format!("no field at path {path:?}").into()
}

/// Submitted form values, keyed by name in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    inner: BTreeMap<String, Vec<String>>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value for `key`
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.inner.get(key).map(Vec::as_slice)
    }

    /// Returns the last value submitted for `key`
    pub fn get_last(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(<[String]>::last).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.inner.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FormValues::new();
        values.extend(iter);
        values
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FormValues {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
