use super::handle::{Handle, SchemaField};
use super::naming::collection_name;
use super::rules::{FieldFacts, first_violation};
use crate::config::MapperConfig;
use crate::convert::ConverterRegistry;
use crate::core::{MapperError, Result};
use crate::parse::ParserRegistry;
use crate::reflect::{ClassDescriptor, ConstructorHandle, FieldDescriptor};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Compiles class descriptors into [`Handle`]s.
///
/// Every failure here is a configuration or reflection error: the type is
/// unusable as declared and retrying will not help.
pub struct HandleBuilder<'a> {
    config: &'a MapperConfig,
    converters: &'a ConverterRegistry,
    parsers: &'a ParserRegistry,
}

impl<'a> HandleBuilder<'a> {
    pub fn new(
        config: &'a MapperConfig,
        converters: &'a ConverterRegistry,
        parsers: &'a ParserRegistry,
    ) -> Self {
        Self {
            config,
            converters,
            parsers,
        }
    }

    pub fn build<E: 'static>(&self, class: &ClassDescriptor<E>) -> Result<Handle<E>> {
        let creator = ConstructorHandle::resolve(class)?;
        if self.config.probe_constructors {
            creator.probe()?;
        }

        let collection_name = collection_name(class.name(), class.collection_override())?;

        let mut seen = HashSet::new();
        let mut fields: Vec<SchemaField<E>> = Vec::new();
        let mut key: Option<(usize, bool)> = None;

        for declaring in class.ancestry() {
            for declared in declaring.fields() {
                if !seen.insert(declared.name().to_string()) {
                    continue;
                }
                if declared.modifiers().excludes_from_schema() {
                    continue;
                }

                let field = self.compile_field(class.name(), declared)?;
                if let Some(marker) = declared.markers().key {
                    if let Some((existing, _)) = key {
                        return Err(MapperError::Configuration(format!(
                            "Type '{}' declares more than one key field: '{}' and '{}'",
                            class.name(),
                            fields[existing].name,
                            declared.name()
                        )));
                    }
                    key = Some((fields.len(), marker.auto));
                }
                fields.push(field);
            }
        }

        let (key, auto_key) = key.ok_or_else(|| {
            MapperError::Configuration(format!("Type '{}' declares no key field", class.name()))
        })?;
        let key_parser = self.parsers.get(&fields[key].ty)?;

        let index: HashMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name.clone(), position))
            .collect();

        debug!(
            "Compiled handle for '{}': collection '{}', {} fields, key '{}'",
            class.name(),
            collection_name,
            fields.len(),
            fields[key].name
        );

        Ok(Handle {
            type_name: class.name().to_string(),
            collection_name,
            fields,
            index,
            key,
            auto_key,
            key_parser,
            creator,
            separator: self.config.path_separator,
        })
    }

    fn compile_field<E: 'static>(
        &self,
        type_name: &str,
        declared: &FieldDescriptor<E>,
    ) -> Result<SchemaField<E>> {
        let facts = FieldFacts::of(declared, self.config.path_separator);
        if let Some((_, message)) = first_violation(&facts) {
            return Err(MapperError::Configuration(format!(
                "Field '{}' of '{}': {}",
                declared.name(),
                type_name,
                message
            )));
        }

        let markers = declared.markers();
        let converter = match &markers.converted {
            Some(reference) => {
                let converter = self.converters.get(reference)?;
                let source = self.converters.get_source_type(converter.as_ref())?;
                if &source != declared.ty() {
                    return Err(MapperError::Configuration(format!(
                        "Field '{}' of '{}' is {} but converter '{}' converts from {}",
                        declared.name(),
                        type_name,
                        declared.ty(),
                        reference.name(),
                        source
                    )));
                }
                Some(converter)
            }
            None => None,
        };

        let property = markers
            .rename
            .clone()
            .unwrap_or_else(|| declared.name().to_string());

        Ok(SchemaField {
            name: declared.name().to_string(),
            property,
            ty: declared.ty().clone(),
            accessor: declared.accessor().clone(),
            converter,
            content_type: markers.file.as_ref().map(|file| file.content_type.clone()),
            web: markers.web,
        })
    }
}
