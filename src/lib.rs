// ============================================================================
// docmap Library
// ============================================================================

#[allow(unused_extern_crates)]
extern crate self as docmap;

pub mod config;
pub mod convert;
pub mod core;
pub mod parse;
pub mod proxy;
pub mod reflect;
pub mod registry;
pub mod schema;

// Re-export main types for convenience
pub use config::MapperConfig;
pub use convert::{Converter, ConverterRef, ConverterRegistry, ErasedConverter};
pub use crate::core::{DocumentData, ErrorCategory, FieldValues, MapperError, PATH_SEPARATOR, Result, Value};
pub use parse::{Parser, ParserRegistry};
pub use proxy::{Proxy, ProxyAccessor, ProxySynthesizer, ProxyType};
pub use reflect::{
    ClassDescriptor, ConstructorHandle, Document, FieldAccessor, FieldDescriptor, TypeInfo,
    ValueOfFactory, Visibility,
};
pub use registry::{RegistryStats, SchemaRegistry};
pub use schema::{Handle, HandleBuilder, SchemaField};

pub use docmap_derive::Document;
