//! String-to-value parsers keyed by target type.
//!
//! Used to turn a document key back into the key field's value. Numeric,
//! boolean, character, big-number and string types are built in, each both
//! bare and wrapped in `Option`. Any other type must bring a well-formed
//! `valueOf` factory through its `TypeInfo`; that factory is checked and
//! cached on first use.

use crate::core::{MapperError, Result, Value};
use crate::reflect::{ParseFn, TypeInfo};
use crate::registry::cache::TypeCache;
use log::debug;
use num_bigint::BigInt;
use rust_decimal::Decimal;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

pub type Parser = ParseFn;

pub struct ParserRegistry {
    builtin: HashMap<TypeId, Parser>,
    resolved: TypeCache<Parser>,
}

fn from_str_parser<T>() -> Parser
where
    T: FromStr + serde::Serialize + 'static,
    T::Err: Display,
{
    Arc::new(|input: &str| {
        let parsed = T::from_str(input).map_err(|err| {
            MapperError::Conversion(format!(
                "cannot parse '{}' as {}: {}",
                input,
                std::any::type_name::<T>(),
                err
            ))
        })?;
        Ok(serde_json::to_value(parsed)?)
    })
}

fn char_parser() -> Parser {
    Arc::new(|input: &str| {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Value::String(ch.to_string())),
            _ => Err(MapperError::Conversion(format!(
                "expected exactly one character, got '{}'",
                input
            ))),
        }
    })
}

macro_rules! register_from_str {
    ($map:expr, $($ty:ty),+ $(,)?) => {
        $(
            $map.insert(TypeId::of::<$ty>(), from_str_parser::<$ty>());
            $map.insert(TypeId::of::<Option<$ty>>(), from_str_parser::<$ty>());
        )+
    };
}

impl ParserRegistry {
    pub fn new() -> Self {
        let mut builtin: HashMap<TypeId, Parser> = HashMap::new();
        register_from_str!(
            builtin, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
            bool, BigInt, Decimal, String,
        );
        builtin.insert(TypeId::of::<char>(), char_parser());
        builtin.insert(TypeId::of::<Option<char>>(), char_parser());

        Self {
            builtin,
            resolved: TypeCache::new(),
        }
    }

    /// Returns the parser for `ty`, resolving its `valueOf` factory on first
    /// request.
    pub fn get(&self, ty: &TypeInfo) -> Result<Parser> {
        if let Some(parser) = self.builtin.get(&ty.id()) {
            return Ok(parser.clone());
        }
        self.resolved
            .get_or_try_init(ty.id(), || resolve_value_of(ty))
    }

    pub fn parse(&self, ty: &TypeInfo, input: &str) -> Result<Value> {
        let parser = self.get(ty)?;
        parser(input)
    }

    /// Number of non-builtin parsers resolved so far.
    pub fn resolved_count(&self) -> Result<usize> {
        self.resolved.len()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_value_of(ty: &TypeInfo) -> Result<Parser> {
    let factory = ty.value_of().ok_or_else(|| {
        MapperError::Reflection(format!(
            "Type '{}' declares no valueOf(String) factory",
            ty.name()
        ))
    })?;

    if !factory.is_public() {
        return Err(MapperError::Reflection(format!(
            "valueOf(String) of '{}' is not public",
            ty.name()
        )));
    }
    if !factory.is_static() {
        return Err(MapperError::Reflection(format!(
            "valueOf(String) of '{}' is not static",
            ty.name()
        )));
    }
    if factory.returns() != ty.id() {
        return Err(MapperError::Reflection(format!(
            "valueOf(String) of '{}' returns '{}'",
            ty.name(),
            factory.returns_name()
        )));
    }
    if factory.declares_checked_errors() {
        return Err(MapperError::Reflection(format!(
            "valueOf(String) of '{}' declares checked errors",
            ty.name()
        )));
    }

    debug!("Resolved valueOf(String) parser for '{}'", ty.name());
    Ok(factory.parse_fn())
}
