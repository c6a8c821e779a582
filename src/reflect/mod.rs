//! Descriptor-based reflection: the type, field and constructor facts the
//! schema builder and proxy synthesizer work from.

pub mod class;
pub mod construct;
pub mod field;
pub mod type_info;

pub use class::{Ancestry, ClassDescriptor, Document};
pub use construct::ConstructorHandle;
pub use field::{FieldAccessor, FieldDescriptor, FieldMarkers, FieldModifiers, FileMarker, KeyMarker};
pub use type_info::{ParseFn, TypeInfo, ValueOfFactory, Visibility};
