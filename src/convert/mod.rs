//! User-supplied bidirectional field converters.

use crate::core::{MapperError, Result, Value};
use crate::reflect::TypeInfo;
use crate::reflect::construct::panic_message;
use crate::registry::cache::TypeCache;
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::{TypeId, type_name};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// A pure, two-way transform between a field's declared type (`Source`) and
/// the type the store persists (`Target`).
pub trait Converter: Send + Sync + 'static {
    type Source: Serialize + DeserializeOwned + 'static;
    type Target: Serialize + DeserializeOwned + 'static;

    fn to_target(&self, value: Self::Source) -> Self::Target;

    fn to_source(&self, value: Self::Target) -> Self::Source;
}

/// A converter with its types erased to JSON values.
pub trait ErasedConverter: Send + Sync {
    fn converter_name(&self) -> &'static str;

    fn source_type(&self) -> TypeInfo;

    fn target_type(&self) -> TypeInfo;

    /// Source -> target.
    fn forward(&self, value: Value) -> Result<Value>;

    /// Target -> source.
    fn reverse(&self, value: Value) -> Result<Value>;
}

struct Erased<C>(C);

impl<C: Converter> ErasedConverter for Erased<C> {
    fn converter_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn source_type(&self) -> TypeInfo {
        TypeInfo::of::<C::Source>()
    }

    fn target_type(&self) -> TypeInfo {
        TypeInfo::of::<C::Target>()
    }

    fn forward(&self, value: Value) -> Result<Value> {
        let source: C::Source = serde_json::from_value(value).map_err(|err| {
            MapperError::Conversion(format!(
                "{} cannot read its source value: {}",
                type_name::<C>(),
                err
            ))
        })?;
        Ok(serde_json::to_value(self.0.to_target(source))?)
    }

    fn reverse(&self, value: Value) -> Result<Value> {
        let target: C::Target = serde_json::from_value(value).map_err(|err| {
            MapperError::Conversion(format!(
                "{} cannot read its target value: {}",
                type_name::<C>(),
                err
            ))
        })?;
        Ok(serde_json::to_value(self.0.to_source(target))?)
    }
}

type ConstructFn = Arc<dyn Fn() -> anyhow::Result<Arc<dyn ErasedConverter>> + Send + Sync>;

/// Names a converter type, as written in a field's converter marker.
#[derive(Clone)]
pub struct ConverterRef {
    id: TypeId,
    name: &'static str,
    construct: ConstructFn,
}

impl ConverterRef {
    /// A converter built with `Default`.
    pub fn of<C: Converter + Default>() -> Self {
        Self::with_constructor::<C>(|| Ok(C::default()))
    }

    /// A converter built by a fallible constructor.
    pub fn with_constructor<C: Converter>(constructor: fn() -> anyhow::Result<C>) -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
            construct: Arc::new(move || {
                let converter = constructor()?;
                Ok(Arc::new(Erased(converter)) as Arc<dyn ErasedConverter>)
            }),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn instantiate(&self) -> Result<Arc<dyn ErasedConverter>> {
        let outcome = catch_unwind(AssertUnwindSafe(|| (self.construct)())).map_err(|payload| {
            MapperError::Reflection(format!(
                "Constructor of converter '{}' panicked: {}",
                self.name,
                panic_message(payload.as_ref())
            ))
        })?;
        outcome.map_err(|err| {
            MapperError::Reflection(format!(
                "Cannot instantiate converter '{}': {:#}",
                self.name, err
            ))
        })
    }
}

impl fmt::Debug for ConverterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for ConverterRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConverterRef {}

/// Lazily constructed converter singletons, one per converter type.
pub struct ConverterRegistry {
    instances: TypeCache<Arc<dyn ErasedConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            instances: TypeCache::new(),
        }
    }

    pub fn get(&self, converter: &ConverterRef) -> Result<Arc<dyn ErasedConverter>> {
        self.instances.get_or_try_init(converter.id(), || {
            let instance = converter.instantiate().inspect_err(|err| {
                warn!("{}", err);
            })?;
            debug!("Instantiated converter '{}'", converter.name());
            Ok(instance)
        })
    }

    /// The source type the converter was declared over.
    ///
    /// A converter whose source is raw JSON accepts anything, so its source
    /// type cannot be pinned to a field type.
    pub fn get_source_type(&self, converter: &dyn ErasedConverter) -> Result<TypeInfo> {
        let source = converter.source_type();
        if source.is::<Value>() {
            return Err(MapperError::Reflection(format!(
                "Cannot resolve the source type of converter '{}': it is left unbound",
                converter.converter_name()
            )));
        }
        Ok(source)
    }

    pub fn len(&self) -> Result<usize> {
        self.instances.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
