use crate::convert::ErasedConverter;
use crate::core::{DocumentData, FieldValues, MapperError, Result, Value, split_path};
use crate::parse::Parser;
use crate::reflect::{ConstructorHandle, FieldAccessor, TypeInfo};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// One mapped field inside a compiled [`Handle`].
pub struct SchemaField<E> {
    pub(crate) name: String,
    pub(crate) property: String,
    pub(crate) ty: TypeInfo,
    pub(crate) accessor: FieldAccessor<E>,
    pub(crate) converter: Option<Arc<dyn ErasedConverter>>,
    pub(crate) content_type: Option<String>,
    pub(crate) web: bool,
}

impl<E: 'static> SchemaField<E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Document key for this field.
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.property
    }

    pub fn ty(&self) -> &TypeInfo {
        &self.ty
    }

    pub fn converter(&self) -> Option<&Arc<dyn ErasedConverter>> {
        self.converter.as_ref()
    }

    pub fn is_file(&self) -> bool {
        self.content_type.is_some()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_web(&self) -> bool {
        self.web
    }

    fn read(&self, instance: &E) -> Result<Value> {
        self.accessor.get(instance)
    }

    /// The field's value as the store holds it: read, then converted.
    pub(crate) fn read_stored(&self, instance: &E) -> Result<Value> {
        self.to_stored(self.read(instance)?)
    }

    /// Writes a stored value back, converting it first. Null leaves the
    /// field untouched.
    pub(crate) fn write_stored(&self, instance: &mut E, value: Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let value = self.from_stored(value)?;
        self.accessor.set(instance, value)
    }

    fn to_stored(&self, value: Value) -> Result<Value> {
        match &self.converter {
            Some(converter) if !value.is_null() => converter.forward(value),
            _ => Ok(value),
        }
    }

    fn from_stored(&self, value: Value) -> Result<Value> {
        match &self.converter {
            Some(converter) => converter.reverse(value),
            None => Ok(value),
        }
    }
}

/// Compiled, immutable mapping between a document type `E` and its store
/// documents.
///
/// Built once per type by [`HandleBuilder`](super::HandleBuilder) and shared
/// through the registry.
pub struct Handle<E> {
    pub(crate) type_name: String,
    pub(crate) collection_name: String,
    pub(crate) fields: Vec<SchemaField<E>>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) key: usize,
    pub(crate) auto_key: bool,
    pub(crate) key_parser: Parser,
    pub(crate) creator: ConstructorHandle<E>,
    pub(crate) separator: char,
}

impl<E: 'static> Handle<E> {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Mapped field names, most derived type's fields first.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn fields(&self) -> &[SchemaField<E>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField<E>> {
        self.index.get(name).map(|&position| &self.fields[position])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn key_field(&self) -> &SchemaField<E> {
        &self.fields[self.key]
    }

    pub fn key_field_name(&self) -> &str {
        &self.key_field().name
    }

    pub fn is_key_field(&self, name: &str) -> bool {
        self.key_field_name() == name
    }

    pub fn is_auto_key(&self) -> bool {
        self.auto_key
    }

    pub fn property_name(&self, field: &str) -> Option<&str> {
        self.field(field).map(|field| field.property.as_str())
    }

    /// Field name -> property name for every mapped field.
    pub fn property_names(&self) -> BTreeMap<&str, &str> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), field.property.as_str()))
            .collect()
    }

    /// File fields in schema order.
    pub fn file_fields(&self) -> impl Iterator<Item = &SchemaField<E>> {
        self.fields.iter().filter(|field| field.is_file())
    }

    pub fn file_field_names(&self) -> BTreeSet<&str> {
        self.file_fields().map(|field| field.name.as_str()).collect()
    }

    pub fn web_field_names(&self) -> BTreeSet<&str> {
        self.fields
            .iter()
            .filter(|field| field.web)
            .map(|field| field.name.as_str())
            .collect()
    }

    /// File field name -> declared content type.
    pub fn content_types(&self) -> BTreeMap<&str, &str> {
        self.fields
            .iter()
            .filter_map(|field| Some((field.name.as_str(), field.content_type.as_deref()?)))
            .collect()
    }

    pub fn content_type(&self, field: &str) -> Option<&str> {
        self.field(field).and_then(SchemaField::content_type)
    }

    pub fn is_file_field(&self, field: &str) -> bool {
        self.field(field).is_some_and(SchemaField::is_file)
    }

    pub fn is_web_field(&self, field: &str) -> bool {
        self.field(field).is_some_and(SchemaField::is_web)
    }

    pub fn converter(&self, field: &str) -> Option<&Arc<dyn ErasedConverter>> {
        self.field(field).and_then(SchemaField::converter)
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Default-constructs a fresh instance.
    pub fn create_instance(&self) -> Result<E> {
        self.creator.invoke()
    }

    pub(crate) fn require_field(&self, name: &str) -> Result<&SchemaField<E>> {
        self.field(name).ok_or_else(|| {
            MapperError::Usage(format!(
                "'{}' is not a mapped field of '{}'",
                name, self.type_name
            ))
        })
    }

    /// Reads a field's raw (unconverted) value.
    pub fn get_field(&self, instance: &E, name: &str) -> Result<Value> {
        self.require_field(name)?.read(instance)
    }

    /// Writes a field's raw (unconverted) value.
    pub fn set_field(&self, instance: &mut E, name: &str, value: Value) -> Result<()> {
        self.require_field(name)?.accessor.set(instance, value)
    }

    pub fn key_value(&self, instance: &E) -> Result<Value> {
        self.key_field().read(instance)
    }

    pub fn set_key_value(&self, instance: &mut E, value: Value) -> Result<()> {
        self.key_field().accessor.set(instance, value)
    }

    /// The key rendered as the document id, or `None` while it is unset.
    pub fn key_to_string(&self, instance: &E) -> Result<Option<String>> {
        Ok(match self.key_value(instance)? {
            Value::Null => None,
            Value::String(key) => Some(key),
            other => Some(other.to_string()),
        })
    }

    /// Parses a document id into the key field's type and stores it.
    pub fn set_key_from_str(&self, instance: &mut E, key: &str) -> Result<()> {
        let value = (self.key_parser)(key)?;
        self.set_key_value(instance, value)
    }

    /// Builds a fresh instance from a stored document.
    ///
    /// Properties that are missing or null leave the field at the value the
    /// zero-argument constructor gave it.
    pub fn to_instance(&self, data: &DocumentData) -> Result<E> {
        let mut instance = self.create_instance()?;
        for field in &self.fields {
            if let Some(value) = stored_value(data, &field.property) {
                field.write_stored(&mut instance, value.clone())?;
            }
        }
        Ok(instance)
    }

    /// Like [`to_instance`](Self::to_instance) but collects the converted
    /// values by field name instead of writing them into an instance.
    pub fn to_values(&self, data: &DocumentData) -> Result<FieldValues> {
        let mut values = FieldValues::new();
        for field in &self.fields {
            if let Some(value) = stored_value(data, &field.property) {
                values.insert(field.name.clone(), field.from_stored(value.clone())?);
            }
        }
        Ok(values)
    }

    /// Renders an instance as a document body.
    ///
    /// File fields are left out unless `include_files` is set. The key is
    /// left out only when `ignore_key` is set; otherwise it is written even
    /// when it is still null.
    pub fn to_data(&self, instance: &E, ignore_key: bool, include_files: bool) -> Result<DocumentData> {
        let mut data = DocumentData::new();
        for (position, field) in self.fields.iter().enumerate() {
            if field.is_file() && !include_files {
                continue;
            }
            if ignore_key && position == self.key {
                continue;
            }
            data.insert(field.property.clone(), field.read_stored(instance)?);
        }
        Ok(data)
    }

    /// Renders a partial update keyed by field name or field-rooted path.
    ///
    /// The key field and file fields cannot be written this way, neither
    /// whole nor through a nested path. Bare field values are converted;
    /// nested values are passed through and only the root segment of their
    /// path is renamed.
    pub fn to_partial_data(&self, values: &FieldValues) -> Result<DocumentData> {
        let mut data = DocumentData::new();
        for (path, value) in values {
            let (root, rest) = split_path(path, self.separator);
            let field = self.require_field(root)?;

            if root == self.key_field_name() {
                return Err(MapperError::Usage(format!(
                    "Cannot modify key field '{}' of '{}'",
                    path, self.type_name
                )));
            }
            if field.is_file() {
                return Err(MapperError::Usage(format!(
                    "Cannot modify file field '{}' of '{}' outside of an upload",
                    path, self.type_name
                )));
            }

            match rest {
                None => {
                    data.insert(field.property.clone(), field.to_stored(value.clone())?);
                }
                Some(rest) => {
                    let property = format!("{}{}{}", field.property, self.separator, rest);
                    data.insert(property, value.clone());
                }
            }
        }
        Ok(data)
    }
}

fn stored_value<'a>(data: &'a DocumentData, property: &str) -> Option<&'a Value> {
    data.get(property).filter(|value| !value.is_null())
}

impl<E> fmt::Debug for Handle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("type_name", &self.type_name)
            .field("collection_name", &self.collection_name)
            .field(
                "fields",
                &self.fields.iter().map(|field| &field.name).collect::<Vec<_>>(),
            )
            .field("key", &self.fields[self.key].name)
            .field("auto_key", &self.auto_key)
            .finish()
    }
}
