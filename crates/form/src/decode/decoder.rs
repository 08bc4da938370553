use super::schema::{Entry, Schema, SchemaRef};
use super::{Decode, FormValues};
use crate::DecodeError;
use arc_swap::ArcSwap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

type SchemaCache = HashMap<TypeId, Arc<Schema>>;

/// Decodes [`FormValues`] into [`Decode`] types.
///
/// Schemas are built once per type and cached; the cache is read without locking and can be
/// shared by any number of concurrent requests.
#[derive(Debug)]
pub struct FieldDecoder {
    schemas: ArcSwap<SchemaCache>,
    ignore_unknown_keys: bool,
}

impl Default for FieldDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldDecoder {
    pub fn new() -> Self {
        Self { schemas: ArcSwap::from_pointee(HashMap::new()), ignore_unknown_keys: false }
    }

    /// Whether keys without a matching field are skipped instead of rejected
    pub fn ignore_unknown_keys(mut self, ignore: bool) -> Self {
        self.ignore_unknown_keys = ignore;
        self
    }

    /// Decodes `values` into `target`.
    ///
    /// Fields without a submitted value keep their current content.
    pub fn decode<T>(&self, target: &mut T, values: &FormValues) -> Result<(), DecodeError>
    where
        T: Decode + 'static,
    {
        let schema = self.schema(SchemaRef::of::<T>());

        for (key, submitted) in values {
            let Some(path) = self.resolve(&schema, key) else {
                if self.ignore_unknown_keys {
                    trace!(key = %key, "ignore unknown form key");
                    continue;
                }
                return Err(DecodeError::unknown_field(key));
            };
            target.assign(&path, submitted).map_err(|e| DecodeError::invalid_field(key, e))?;
        }

        match schema.required().iter().find(|key| !has_value(values, key)) {
            Some(key) => Err(DecodeError::missing_field(key)),
            None => Ok(()),
        }
    }

    /// Returns the cached schema of `T`, building it on first use
    pub fn schema_of<T: Decode + 'static>(&self) -> Arc<Schema> {
        self.schema(SchemaRef::of::<T>())
    }

    /// Number of types with a cached schema
    pub fn cached_schemas(&self) -> usize {
        self.schemas.load().len()
    }

    fn schema(&self, schema_ref: SchemaRef) -> Arc<Schema> {
        let type_id = schema_ref.type_id();
        if let Some(schema) = self.schemas.load().get(&type_id) {
            return Arc::clone(schema);
        }

        trace!(type_name = schema_ref.type_name(), "build form schema");
        let built = Arc::new(schema_ref.build());

        // another request may have raced us here, whichever schema landed first is kept
        self.schemas.rcu(|current| {
            let mut next = SchemaCache::clone(current);
            next.entry(type_id).or_insert_with(|| Arc::clone(&built));
            next
        });
        self.schemas.load().get(&type_id).map_or(built, Arc::clone)
    }

    /// Resolves `key` to a field path, following dotted keys into nested structures
    fn resolve(&self, schema: &Schema, key: &str) -> Option<Vec<usize>> {
        if let Some(Entry::Value { path }) = schema.get(key) {
            return Some(path.to_vec());
        }

        let (head, rest) = key.split_once('.')?;
        let Some(Entry::Nested { path, schema: nested }) = schema.get(head) else {
            return None;
        };
        let nested = self.schema(*nested);
        let mut resolved = path.to_vec();
        resolved.extend(self.resolve(&nested, rest)?);
        Some(resolved)
    }
}

fn has_value(values: &FormValues, key: &str) -> bool {
    values.get(key).is_some_and(|submitted| submitted.iter().any(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{SchemaBuilder, assign_value, unknown_path};
    use crate::BoxError;
    use std::thread;

    #[derive(Debug, Default, PartialEq)]
    struct Inner {
        baz: i32,
        tags: Vec<String>,
    }

    impl Decode for Inner {
        fn describe(schema: &mut SchemaBuilder) {
            schema.value(0, "baz", false);
            schema.value(1, "tags", false);
        }

        fn assign(&mut self, path: &[usize], values: &[String]) -> Result<(), BoxError> {
            match path {
                [0] => assign_value(&mut self.baz, values),
                [1] => assign_value(&mut self.tags, values),
                _ => Err(unknown_path(path)),
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outer {
        foo: i32,
        name: String,
        inner: Option<Box<Inner>>,
        child: Option<Box<Outer>>,
    }

    impl Decode for Outer {
        fn describe(schema: &mut SchemaBuilder) {
            schema.value(0, "foo", false);
            schema.value(1, "name", true);
            schema.embed::<Option<Box<Inner>>>(2);
            schema.nested::<Option<Box<Outer>>>(3, "child");
        }

        fn assign(&mut self, path: &[usize], values: &[String]) -> Result<(), BoxError> {
            match path {
                [0] => assign_value(&mut self.foo, values),
                [1] => assign_value(&mut self.name, values),
                [2, rest @ ..] => self.inner.assign(rest, values),
                [3, rest @ ..] => self.child.assign(rest, values),
                _ => Err(unknown_path(path)),
            }
        }
    }

    fn values(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn decodes_embedded_and_nested_fields() {
        let decoder = FieldDecoder::new();
        let mut outer = Outer::default();
        let form = values(&[
            ("foo", "1"),
            ("name", "zava"),
            ("baz", "2"),
            ("tags", "a"),
            ("tags", "b"),
            ("child.foo", "3"),
            ("child.baz", "4"),
            ("child.child.name", "deep"),
        ]);
        decoder.decode(&mut outer, &form).unwrap();

        assert_eq!(outer.foo, 1);
        assert_eq!(outer.name, "zava");
        assert_eq!(outer.inner, Some(Box::new(Inner { baz: 2, tags: vec!["a".into(), "b".into()] })));

        let child = outer.child.as_deref().unwrap();
        assert_eq!(child.foo, 3);
        assert_eq!(child.inner.as_ref().map(|inner| inner.baz), Some(4));
        assert_eq!(child.child.as_ref().map(|c| c.name.as_str()), Some("deep"));
    }

    #[test]
    fn untouched_embedded_stays_none() {
        let decoder = FieldDecoder::new();
        let mut outer = Outer::default();
        decoder.decode(&mut outer, &values(&[("name", "zava")])).unwrap();
        assert_eq!(outer.inner, None);
        assert_eq!(outer.child, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        let decoder = FieldDecoder::new();
        let error = decoder.decode(&mut Outer::default(), &values(&[("name", "zava"), ("nope", "1")])).unwrap_err();
        assert!(matches!(error, DecodeError::UnknownField { ref key } if key == "nope"));

        let error = decoder.decode(&mut Outer::default(), &values(&[("name", "zava"), ("child.nope", "1")])).unwrap_err();
        assert!(matches!(error, DecodeError::UnknownField { ref key } if key == "child.nope"));
    }

    #[test]
    fn ignores_unknown_keys_when_asked() {
        let decoder = FieldDecoder::new().ignore_unknown_keys(true);
        let mut outer = Outer::default();
        decoder.decode(&mut outer, &values(&[("name", "zava"), ("csrf", "token")])).unwrap();
        assert_eq!(outer.name, "zava");
    }

    #[test]
    fn reports_coercion_failures_with_key() {
        let decoder = FieldDecoder::new();
        let error = decoder.decode(&mut Outer::default(), &values(&[("name", "zava"), ("baz", "two")])).unwrap_err();
        assert!(matches!(error, DecodeError::InvalidField { ref key, .. } if key == "baz"));
    }

    #[test]
    fn required_keys_must_have_a_value() {
        let decoder = FieldDecoder::new();
        let error = decoder.decode(&mut Outer::default(), &values(&[("foo", "1")])).unwrap_err();
        assert!(matches!(error, DecodeError::MissingField { ref key } if key == "name"));

        let error = decoder.decode(&mut Outer::default(), &values(&[("name", "  ")])).unwrap_err();
        assert!(matches!(error, DecodeError::MissingField { .. }));
    }

    #[test]
    fn schemas_are_cached_per_type() {
        let decoder = FieldDecoder::new();
        assert_eq!(decoder.cached_schemas(), 0);

        let first = decoder.schema_of::<Outer>();
        let again = decoder.schema_of::<Outer>();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(decoder.cached_schemas(), 1);

        let form = values(&[("name", "zava"), ("child.foo", "1")]);
        let mut one = Outer::default();
        let mut two = Outer::default();
        decoder.decode(&mut one, &form).unwrap();
        decoder.decode(&mut two, &form).unwrap();
        assert_eq!(one, two);
        // Outer and the nested Option<Box<Outer>>
        assert_eq!(decoder.cached_schemas(), 2);
    }

    #[test]
    fn concurrent_first_use_is_idempotent() {
        let decoder = Arc::new(FieldDecoder::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let decoder = Arc::clone(&decoder);
                thread::spawn(move || {
                    let mut outer = Outer::default();
                    decoder.decode(&mut outer, &values(&[("name", "zava"), ("foo", "5")])).map(|()| outer)
                })
            })
            .collect();

        for handle in handles {
            let outer = handle.join().unwrap().unwrap();
            assert_eq!(outer.foo, 5);
        }
        assert_eq!(decoder.cached_schemas(), 1);
    }
}
