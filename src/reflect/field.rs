use super::TypeInfo;
use crate::convert::ConverterRef;
use crate::core::{MapperError, Result, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

type Getter<E> = Arc<dyn Fn(&E) -> Result<Value> + Send + Sync>;
type Setter<E> = Arc<dyn Fn(&mut E, Value) -> Result<()> + Send + Sync>;

/// Type-erased read/write access to one field of `E`.
///
/// Values cross the accessor as JSON so that a handle can move them between
/// instances and documents without knowing the field's static type.
pub struct FieldAccessor<E> {
    getter: Getter<E>,
    setter: Setter<E>,
}

impl<E: 'static> FieldAccessor<E> {
    pub fn new<G, S>(getter: G, setter: S) -> Self
    where
        G: Fn(&E) -> Result<Value> + Send + Sync + 'static,
        S: Fn(&mut E, Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    /// Accessor for a serde-compatible field reached through `get`/`get_mut`.
    pub fn for_field<T>(get: fn(&E) -> &T, get_mut: fn(&mut E) -> &mut T) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self::new(
            move |target| Ok(serde_json::to_value(get(target))?),
            move |target, value| {
                *get_mut(target) = serde_json::from_value(value)?;
                Ok(())
            },
        )
    }

    /// Accessor for a field the schema never maps, such as a transient
    /// cache. It places no bounds on the field type and fails if called.
    pub fn unmapped(field_name: &'static str) -> Self {
        Self::new(
            move |_| {
                Err(MapperError::Usage(format!(
                    "Field '{}' is not mapped and cannot be read",
                    field_name
                )))
            },
            move |_, _| {
                Err(MapperError::Usage(format!(
                    "Field '{}' is not mapped and cannot be written",
                    field_name
                )))
            },
        )
    }

    pub fn get(&self, target: &E) -> Result<Value> {
        (self.getter)(target)
    }

    pub fn set(&self, target: &mut E, value: Value) -> Result<()> {
        (self.setter)(target, value)
    }

    /// Re-targets this accessor onto `D`, which embeds an `E`.
    pub fn lift<D: 'static>(
        self,
        project: fn(&D) -> &E,
        project_mut: fn(&mut D) -> &mut E,
    ) -> FieldAccessor<D> {
        let getter = self.getter;
        let setter = self.setter;
        FieldAccessor::new(
            move |target: &D| getter(project(target)),
            move |target: &mut D, value| setter(project_mut(target), value),
        )
    }
}

impl<E> Clone for FieldAccessor<E> {
    fn clone(&self) -> Self {
        Self {
            getter: self.getter.clone(),
            setter: self.setter.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldModifiers {
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
}

impl FieldModifiers {
    /// Fields that never take part in a document mapping.
    pub fn excludes_from_schema(&self) -> bool {
        self.is_static || self.is_final || self.is_transient
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMarker {
    pub auto: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMarker {
    pub content_type: String,
}

/// Mapping markers attached to a field declaration.
#[derive(Debug, Clone, Default)]
pub struct FieldMarkers {
    pub key: Option<KeyMarker>,
    pub converted: Option<ConverterRef>,
    pub file: Option<FileMarker>,
    pub web: bool,
    pub rename: Option<String>,
}

/// One declared field of a document type.
pub struct FieldDescriptor<E> {
    name: String,
    ty: TypeInfo,
    modifiers: FieldModifiers,
    markers: FieldMarkers,
    accessor: FieldAccessor<E>,
}

impl<E: 'static> FieldDescriptor<E> {
    pub fn new(name: impl Into<String>, ty: TypeInfo, accessor: FieldAccessor<E>) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: FieldModifiers::default(),
            markers: FieldMarkers::default(),
            accessor,
        }
    }

    pub fn key(mut self) -> Self {
        self.markers.key = Some(KeyMarker { auto: false });
        self
    }

    pub fn auto_key(mut self) -> Self {
        self.markers.key = Some(KeyMarker { auto: true });
        self
    }

    pub fn rename(mut self, property: impl Into<String>) -> Self {
        self.markers.rename = Some(property.into());
        self
    }

    pub fn file(mut self, content_type: impl Into<String>) -> Self {
        self.markers.file = Some(FileMarker {
            content_type: content_type.into(),
        });
        self
    }

    pub fn web(mut self) -> Self {
        self.markers.web = true;
        self
    }

    pub fn converted(mut self, converter: ConverterRef) -> Self {
        self.markers.converted = Some(converter);
        self
    }

    pub fn transient(mut self) -> Self {
        self.modifiers.is_transient = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.modifiers.is_final = true;
        self
    }

    pub fn shared(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &TypeInfo {
        &self.ty
    }

    pub fn modifiers(&self) -> FieldModifiers {
        self.modifiers
    }

    pub fn markers(&self) -> &FieldMarkers {
        &self.markers
    }

    pub fn accessor(&self) -> &FieldAccessor<E> {
        &self.accessor
    }

    pub fn lift<D: 'static>(
        self,
        project: fn(&D) -> &E,
        project_mut: fn(&mut D) -> &mut E,
    ) -> FieldDescriptor<D> {
        FieldDescriptor {
            name: self.name,
            ty: self.ty,
            modifiers: self.modifiers,
            markers: self.markers,
            accessor: self.accessor.lift(project, project_mut),
        }
    }
}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("modifiers", &self.modifiers)
            .field("markers", &self.markers)
            .finish()
    }
}
