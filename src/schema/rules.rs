//! Field-level marker rules, evaluated once per field while a handle is
//! compiled.

use crate::reflect::FieldDescriptor;

/// The facts about one field that the rules look at.
#[derive(Debug, Clone)]
pub struct FieldFacts<'a> {
    pub name: &'a str,
    pub type_name: &'a str,
    pub is_string: bool,
    pub is_key: bool,
    pub is_auto_key: bool,
    pub is_converted: bool,
    pub is_file: bool,
    pub is_web: bool,
    pub rename: Option<&'a str>,
    pub separator: char,
}

impl<'a> FieldFacts<'a> {
    pub fn of<E: 'static>(field: &'a FieldDescriptor<E>, separator: char) -> Self {
        let markers = field.markers();
        Self {
            name: field.name(),
            type_name: field.ty().name(),
            is_string: field.ty().is_string(),
            is_key: markers.key.is_some(),
            is_auto_key: markers.key.is_some_and(|key| key.auto),
            is_converted: markers.converted.is_some(),
            is_file: markers.file.is_some(),
            is_web: markers.web,
            rename: markers.rename.as_deref(),
            separator,
        }
    }
}

/// A marker combination that must not occur.
pub struct FieldRule {
    pub name: &'static str,
    pub violated: fn(&FieldFacts<'_>) -> bool,
    pub message: fn(&FieldFacts<'_>) -> String,
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        name: "key-not-converted",
        violated: |f| f.is_key && f.is_converted,
        message: |_| "a key field cannot be converted".to_string(),
    },
    FieldRule {
        name: "key-not-file",
        violated: |f| f.is_key && f.is_file,
        message: |_| "a key field cannot be a file field".to_string(),
    },
    FieldRule {
        name: "auto-key-string",
        violated: |f| f.is_auto_key && !f.is_string,
        message: |f| format!("an auto-generated key must be a String, found {}", f.type_name),
    },
    FieldRule {
        name: "file-string",
        violated: |f| f.is_file && !f.is_string,
        message: |f| format!("a file field must be a String, found {}", f.type_name),
    },
    FieldRule {
        name: "file-not-converted",
        violated: |f| f.is_file && f.is_converted,
        message: |_| "a file field cannot be converted".to_string(),
    },
    FieldRule {
        name: "web-requires-file",
        violated: |f| f.is_web && !f.is_file,
        message: |_| "the web marker is only allowed on file fields".to_string(),
    },
    FieldRule {
        name: "rename-not-blank",
        violated: |f| f.rename.is_some_and(|rename| rename.trim().is_empty()),
        message: |_| "a property rename must not be blank".to_string(),
    },
    FieldRule {
        name: "rename-no-separator",
        violated: |f| f.rename.is_some_and(|rename| rename.contains(f.separator)),
        message: |f| format!("a property rename must not contain '{}'", f.separator),
    },
];

/// First rule the field breaks, if any.
pub fn first_violation<'r>(facts: &FieldFacts<'_>) -> Option<(&'r FieldRule, String)> {
    FIELD_RULES
        .iter()
        .find(|rule| (rule.violated)(facts))
        .map(|rule| (rule, (rule.message)(facts)))
}
