use super::ClassDescriptor;
use crate::core::{MapperError, Result};
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// A resolved zero-argument constructor.
pub struct ConstructorHandle<E> {
    type_name: String,
    constructor: fn() -> E,
}

impl<E: 'static> ConstructorHandle<E> {
    /// Fails when the type declares no zero-argument constructor.
    pub fn resolve(class: &ClassDescriptor<E>) -> Result<Self> {
        let constructor = class.zero_arg_constructor().ok_or_else(|| {
            MapperError::Reflection(format!(
                "Type '{}' has no zero-argument constructor",
                class.name()
            ))
        })?;
        Ok(Self {
            type_name: class.name().to_string(),
            constructor,
        })
    }

    /// Runs the constructor. A panic inside it comes back as an invocation
    /// failure rather than unwinding through the caller.
    pub fn invoke(&self) -> Result<E> {
        catch_unwind(AssertUnwindSafe(self.constructor)).map_err(|payload| {
            MapperError::Reflection(format!(
                "Constructor of '{}' failed: {}",
                self.type_name,
                panic_message(payload.as_ref())
            ))
        })
    }

    /// Constructs and discards one instance.
    pub fn probe(&self) -> Result<()> {
        self.invoke().map(drop)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl<E> Clone for ConstructorHandle<E> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            constructor: self.constructor,
        }
    }
}

impl<E> fmt::Debug for ConstructorHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorHandle")
            .field("type_name", &self.type_name)
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
