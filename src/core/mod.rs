pub mod error;
pub mod value;

pub use error::{ErrorCategory, MapperError, Result};
pub use value::{DocumentData, FieldValues, PATH_SEPARATOR, Value, split_path};
