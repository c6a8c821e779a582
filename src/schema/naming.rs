use crate::core::{MapperError, Result};

/// Default collection name for a type: its simple name pluralized.
///
/// Names already ending in `s` are kept, a trailing `y` becomes `ies`,
/// anything else gains an `s`.
pub fn pluralize(simple_name: &str) -> String {
    if simple_name.ends_with('s') {
        simple_name.to_string()
    } else if let Some(stem) = simple_name.strip_suffix('y') {
        format!("{}ies", stem)
    } else {
        format!("{}s", simple_name)
    }
}

/// Last path segment of a Rust type name, generics stripped.
pub fn simple_name(type_name: &str) -> &str {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}

pub fn collection_name(type_name: &str, explicit: Option<&str>) -> Result<String> {
    match explicit {
        Some(explicit) => {
            let trimmed = explicit.trim();
            if trimmed.is_empty() {
                return Err(MapperError::Configuration(format!(
                    "Collection name of '{}' must not be blank",
                    type_name
                )));
            }
            Ok(trimmed.to_string())
        }
        None => Ok(pluralize(simple_name(type_name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_by_convention() {
        assert_eq!(pluralize("TypeName"), "TypeNames");
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("Address"), "Address");
        assert_eq!(pluralize("Status"), "Status");
    }

    #[test]
    fn simple_name_strips_module_path() {
        assert_eq!(simple_name("app::model::Invoice"), "Invoice");
        assert_eq!(simple_name("Invoice"), "Invoice");
        assert_eq!(simple_name("app::Page<app::Item>"), "Page");
    }

    #[test]
    fn explicit_collection_is_trimmed() {
        assert_eq!(
            collection_name("Invoice", Some("  billing ")).unwrap(),
            "billing"
        );
        assert_eq!(collection_name("app::Invoice", None).unwrap(), "Invoices");
        assert!(collection_name("Invoice", Some("   ")).is_err());
    }
}
