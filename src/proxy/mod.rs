//! Proxy types: per-document-type accessor tables that expose a wrapped
//! instance to a store client as getter/setter pairs tagged with document
//! property names.
//!
//! A proxy type is synthesized once per document type from its handle and
//! cached. Synthesis works from an already validated handle, so any failure
//! in it is a defect and panics.

use crate::core::{DocumentData, MapperError, Result, Value};
use crate::reflect::TypeInfo;
use crate::registry::cache::TypeCache;
use crate::schema::Handle;
use chrono::Utc;
use log::debug;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info_span;

const GETTER_PREFIX: &str = "get_";
const SETTER_PREFIX: &str = "set_";

/// One synthesized getter/setter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAccessor {
    field_name: String,
    getter: String,
    setter: String,
    property_tag: Option<String>,
    ty: TypeInfo,
}

impl ProxyAccessor {
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn getter(&self) -> &str {
        &self.getter
    }

    pub fn setter(&self) -> &str {
        &self.setter
    }

    /// Explicit property name, present only when it differs from the field
    /// name.
    pub fn property_tag(&self) -> Option<&str> {
        self.property_tag.as_deref()
    }

    /// The name the store uses for this accessor's value.
    pub fn property_name(&self) -> &str {
        self.property_tag.as_deref().unwrap_or(&self.field_name)
    }

    pub fn ty(&self) -> &TypeInfo {
        &self.ty
    }
}

/// A synthesized proxy type for document type `E`.
pub struct ProxyType<E> {
    class_name: String,
    handle: Arc<Handle<E>>,
    accessors: Vec<ProxyAccessor>,
    getters: HashMap<String, usize>,
    setters: HashMap<String, usize>,
}

impl<E: 'static> ProxyType<E> {
    fn synthesize(class_name: String, handle: Arc<Handle<E>>) -> Self {
        let mut accessors = Vec::with_capacity(handle.fields().len());
        let mut getters = HashMap::new();
        let mut setters = HashMap::new();

        for field in handle.fields() {
            let accessor = ProxyAccessor {
                field_name: field.name().to_string(),
                getter: format!("{}{}", GETTER_PREFIX, field.name()),
                setter: format!("{}{}", SETTER_PREFIX, field.name()),
                property_tag: field.is_renamed().then(|| field.property().to_string()),
                ty: field.ty().clone(),
            };

            let position = accessors.len();
            let duplicate_getter = getters.insert(accessor.getter.clone(), position);
            let duplicate_setter = setters.insert(accessor.setter.clone(), position);
            assert!(
                duplicate_getter.is_none() && duplicate_setter.is_none(),
                "proxy {} emitted accessor '{}' twice",
                class_name,
                accessor.field_name
            );
            accessors.push(accessor);
        }

        assert!(
            getters.contains_key(&format!("{}{}", GETTER_PREFIX, handle.key_field_name())),
            "proxy {} is missing its key accessor",
            class_name
        );

        Self {
            class_name,
            handle,
            accessors,
            getters,
            setters,
        }
    }

    /// Unique name of the synthesized type.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn handle(&self) -> &Arc<Handle<E>> {
        &self.handle
    }

    pub fn accessors(&self) -> &[ProxyAccessor] {
        &self.accessors
    }

    pub fn accessor(&self, field_name: &str) -> Option<&ProxyAccessor> {
        self.getters
            .get(&format!("{}{}", GETTER_PREFIX, field_name))
            .map(|&position| &self.accessors[position])
    }

    /// Default construction: a fresh instance from the type's own handle.
    pub fn instantiate(self: &Arc<Self>) -> Result<Proxy<E>> {
        let instance = self.handle.create_instance()?;
        Ok(self.wrap(self.handle.clone(), instance))
    }

    /// Wraps an existing instance under the given handle.
    pub fn wrap(self: &Arc<Self>, handle: Arc<Handle<E>>, instance: E) -> Proxy<E> {
        Proxy {
            class: self.clone(),
            handle,
            wrapped: instance,
        }
    }

    /// A fresh proxy whose key is already set from a document id.
    pub fn at_key(self: &Arc<Self>, key: &str) -> Result<Proxy<E>> {
        let mut proxy = self.instantiate()?;
        proxy.handle.set_key_from_str(&mut proxy.wrapped, key)?;
        Ok(proxy)
    }
}

impl<E> fmt::Debug for ProxyType<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("class_name", &self.class_name)
            .field("accessors", &self.accessors)
            .finish()
    }
}

/// An instance of a synthesized proxy type wrapping one `E`.
///
/// Getters and setters work on raw field values. Serializes as a map keyed
/// by each accessor's property name holding converted values, which is how
/// a store client sees it.
pub struct Proxy<E> {
    class: Arc<ProxyType<E>>,
    handle: Arc<Handle<E>>,
    wrapped: E,
}

impl<E: 'static> Proxy<E> {
    pub fn proxy_type(&self) -> &Arc<ProxyType<E>> {
        &self.class
    }

    pub fn instance(&self) -> &E {
        &self.wrapped
    }

    pub fn instance_mut(&mut self) -> &mut E {
        &mut self.wrapped
    }

    pub fn into_inner(self) -> E {
        self.wrapped
    }

    pub fn invoke_getter(&self, getter: &str) -> Result<Value> {
        let position = self.class.getters.get(getter).ok_or_else(|| {
            MapperError::Usage(format!(
                "Proxy {} has no getter '{}'",
                self.class.class_name, getter
            ))
        })?;
        let field_name = &self.class.accessors[*position].field_name;
        self.handle.get_field(&self.wrapped, field_name)
    }

    pub fn invoke_setter(&mut self, setter: &str, value: Value) -> Result<()> {
        let position = self.class.setters.get(setter).ok_or_else(|| {
            MapperError::Usage(format!(
                "Proxy {} has no setter '{}'",
                self.class.class_name, setter
            ))
        })?;
        let field_name = &self.class.accessors[*position].field_name;
        self.handle.set_field(&mut self.wrapped, field_name, value)
    }

    /// Fills the wrapped instance from a store document, matching document
    /// properties against accessor property names and converting values
    /// back to field types. Unknown and null properties are ignored.
    pub fn read_document(&mut self, data: &DocumentData) -> Result<()> {
        for accessor in &self.class.accessors {
            if let Some(value) = data.get(accessor.property_name()) {
                self.handle
                    .require_field(&accessor.field_name)?
                    .write_stored(&mut self.wrapped, value.clone())?;
            }
        }
        Ok(())
    }

    /// The document a store client writes for this proxy: property name ->
    /// converted field value, for every accessor.
    pub fn to_document(&self) -> Result<DocumentData> {
        let mut data = DocumentData::new();
        for accessor in &self.class.accessors {
            data.insert(
                accessor.property_name().to_string(),
                self.stored_value(accessor)?,
            );
        }
        Ok(data)
    }

    fn stored_value(&self, accessor: &ProxyAccessor) -> Result<Value> {
        self.handle
            .require_field(&accessor.field_name)?
            .read_stored(&self.wrapped)
    }
}

impl<E: 'static> Serialize for Proxy<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.class.accessors.len()))?;
        for accessor in &self.class.accessors {
            let value = self.stored_value(accessor).map_err(S::Error::custom)?;
            map.serialize_entry(accessor.property_name(), &value)?;
        }
        map.end()
    }
}

impl<E: fmt::Debug> fmt::Debug for Proxy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("class", &self.class.class_name)
            .field("wrapped", &self.wrapped)
            .finish()
    }
}

/// Synthesizes and caches one proxy type per document type.
pub struct ProxySynthesizer {
    name_prefix: String,
    types: TypeCache<Arc<dyn Any + Send + Sync>>,
    synthesized: AtomicUsize,
}

impl ProxySynthesizer {
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            types: TypeCache::new(),
            synthesized: AtomicUsize::new(0),
        }
    }

    /// The proxy type for `E`, synthesized from `handle` on first request.
    pub fn proxy_type<E: 'static>(&self, handle: Arc<Handle<E>>) -> Result<Arc<ProxyType<E>>> {
        let erased = self.types.get_or_try_init(TypeId::of::<E>(), || {
            let _span = info_span!("synthesize_proxy", type_name = handle.type_name()).entered();
            let class_name = self.unique_name(handle.type_name());
            let proxy_type = ProxyType::synthesize(class_name, handle);
            debug!(
                "Synthesized proxy type '{}' with {} accessors",
                proxy_type.class_name,
                proxy_type.accessors.len()
            );
            Ok(Arc::new(proxy_type) as Arc<dyn Any + Send + Sync>)
        })?;

        Ok(erased.downcast::<ProxyType<E>>().unwrap_or_else(|_| {
            panic!(
                "proxy cache entry for '{}' holds another type",
                std::any::type_name::<E>()
            )
        }))
    }

    /// Wraps `instance` in the cached proxy type for `E`.
    pub fn create_proxy<E: 'static>(&self, handle: Arc<Handle<E>>, instance: E) -> Result<Proxy<E>> {
        let proxy_type = self.proxy_type(handle.clone())?;
        Ok(proxy_type.wrap(handle, instance))
    }

    pub fn unwrap<E: 'static>(&self, proxy: Proxy<E>) -> E {
        proxy.into_inner()
    }

    pub fn len(&self) -> Result<usize> {
        self.types.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn unique_name(&self, type_name: &str) -> String {
        let sequence = self.synthesized.fetch_add(1, Ordering::SeqCst);
        format!(
            "{}${}${}${}",
            self.name_prefix,
            type_name.replace("::", "_"),
            Utc::now().timestamp_micros(),
            sequence
        )
    }
}

impl Default for ProxySynthesizer {
    fn default() -> Self {
        Self::new("Proxy")
    }
}
