//! Schema compilation: from a class descriptor to an immutable [`Handle`].

pub mod builder;
pub mod handle;
pub mod naming;
pub mod rules;

pub use builder::HandleBuilder;
pub use handle::{Handle, SchemaField};
pub use naming::{collection_name, pluralize};
pub use rules::{FIELD_RULES, FieldFacts, FieldRule};
