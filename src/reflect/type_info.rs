use crate::core::{MapperError, Result, Value};
use serde::Serialize;
use std::any::{TypeId, type_name};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A string-to-value parsing function.
pub type ParseFn = Arc<dyn Fn(&str) -> Result<Value> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A `valueOf`-style factory declared by a type: takes one string, returns
/// an instance of the declaring type.
///
/// The signature facts (return type, visibility, receiver, error contract)
/// are recorded so the parsing registry can reject malformed factories.
#[derive(Clone)]
pub struct ValueOfFactory {
    returns: TypeId,
    returns_name: &'static str,
    visibility: Visibility,
    is_static: bool,
    throws_checked: bool,
    parse: ParseFn,
}

impl ValueOfFactory {
    /// Wraps `T::from_str` as a public static factory returning `T`.
    pub fn parsing<T>() -> Self
    where
        T: FromStr + Serialize + 'static,
        T::Err: fmt::Display,
    {
        Self::new::<T>(|input| T::from_str(input).map_err(|err| err.to_string()))
    }

    /// A public static factory returning `T`.
    pub fn new<T>(factory: fn(&str) -> std::result::Result<T, String>) -> Self
    where
        T: Serialize + 'static,
    {
        Self {
            returns: TypeId::of::<T>(),
            returns_name: type_name::<T>(),
            visibility: Visibility::Public,
            is_static: true,
            throws_checked: false,
            parse: Arc::new(move |input| {
                let parsed = factory(input).map_err(|err| {
                    MapperError::Conversion(format!(
                        "cannot parse '{}' as {}: {}",
                        input,
                        type_name::<T>(),
                        err
                    ))
                })?;
                Ok(serde_json::to_value(parsed)?)
            }),
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Marks the factory as needing a receiver.
    pub fn instance_method(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Marks the factory as declaring errors its callers must handle.
    pub fn throws_checked(mut self) -> Self {
        self.throws_checked = true;
        self
    }

    pub fn returns(&self) -> TypeId {
        self.returns
    }

    pub fn returns_name(&self) -> &'static str {
        self.returns_name
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn declares_checked_errors(&self) -> bool {
        self.throws_checked
    }

    pub fn parse_fn(&self) -> ParseFn {
        self.parse.clone()
    }
}

impl fmt::Debug for ValueOfFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueOfFactory")
            .field("returns", &self.returns_name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("throws_checked", &self.throws_checked)
            .finish()
    }
}

/// Runtime identity of a Rust type plus the little reflection metadata the
/// mapper needs about it.
#[derive(Clone)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    value_of: Option<ValueOfFactory>,
}

impl TypeInfo {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            value_of: None,
        }
    }

    /// A type whose `FromStr` impl serves as its `valueOf` factory.
    pub fn parsable<T>() -> Self
    where
        T: FromStr + Serialize + 'static,
        T::Err: fmt::Display,
    {
        Self::of::<T>().with_value_of(ValueOfFactory::parsing::<T>())
    }

    pub fn with_value_of(mut self, factory: ValueOfFactory) -> Self {
        self.value_of = Some(factory);
        self
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_of(&self) -> Option<&ValueOfFactory> {
        self.value_of.as_ref()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Plain and nullable strings both count as string-typed.
    pub fn is_string(&self) -> bool {
        self.is::<String>() || self.is::<Option<String>>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_strings_are_string_typed() {
        assert!(TypeInfo::of::<String>().is_string());
        assert!(TypeInfo::of::<Option<String>>().is_string());
        assert!(!TypeInfo::of::<i64>().is_string());
        assert!(!TypeInfo::of::<&'static str>().is_string());
    }

    #[test]
    fn equality_is_by_type_identity() {
        assert_eq!(TypeInfo::of::<u8>(), TypeInfo::parsable::<u8>());
        assert_ne!(TypeInfo::of::<u8>(), TypeInfo::of::<i8>());
    }

    #[test]
    fn parsing_factory_parses_into_json() {
        let info = TypeInfo::parsable::<u16>();
        let factory = info.value_of().unwrap();
        assert!(factory.is_public() && factory.is_static());
        assert_eq!((factory.parse_fn())("42").unwrap(), Value::from(42));
        assert!((factory.parse_fn())("-1").is_err());
    }
}
