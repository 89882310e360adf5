//! Read-only index over every file of a request
//!
//! Built once in single-package mode, before any template renders, then
//! shared by reference with every rendering task. Nothing mutates it after
//! [`Registry::load`] returns.

use crate::bridge;
use crate::schema::{EnumType, FileDescriptor, MessageType, Service};
use crate::GeneratorError;
use indexmap::IndexMap;
use prost_reflect::DescriptorPool;
use std::collections::HashMap;

/// Name-indexed view of the request's descriptors
#[derive(Debug)]
pub struct Registry {
    pool: DescriptorPool,
    files: IndexMap<String, FileDescriptor>,
    messages: HashMap<String, MessageType>,
    enums: HashMap<String, EnumType>,
    services: HashMap<String, Service>,
}

impl Registry {
    /// Index `files` and link their cross-file references
    ///
    /// Fails when the files do not form a consistent descriptor set, for
    /// example when an import is missing.
    pub fn load(files: &[FileDescriptor]) -> Result<Self, GeneratorError> {
        let set = prost_types::FileDescriptorSet {
            file: files.iter().map(bridge::prost::export_file).collect(),
        };
        let pool = DescriptorPool::from_file_descriptor_set(set)
            .map_err(|e| GeneratorError::Registry(e.to_string()))?;

        let mut registry = Self {
            pool,
            files: IndexMap::with_capacity(files.len()),
            messages: HashMap::new(),
            enums: HashMap::new(),
            services: HashMap::new(),
        };
        for file in files {
            registry.index_file(file);
        }

        tracing::debug!(
            files = registry.files.len(),
            messages = registry.messages.len(),
            enums = registry.enums.len(),
            services = registry.services.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    fn index_file(&mut self, file: &FileDescriptor) {
        let package = file.package();
        for message in &file.message_type {
            self.index_message(package, message);
        }
        for e in &file.enum_type {
            self.enums.insert(qualify(package, e.name()), e.clone());
        }
        for service in &file.service {
            self.services
                .insert(qualify(package, service.name()), service.clone());
        }
        self.files.insert(file.name().to_string(), file.clone());
    }

    fn index_message(&mut self, scope: &str, message: &MessageType) {
        let full_name = qualify(scope, message.name());
        for nested in &message.nested_type {
            self.index_message(&full_name, nested);
        }
        for e in &message.enum_type {
            self.enums.insert(qualify(&full_name, e.name()), e.clone());
        }
        self.messages.insert(full_name, message.clone());
    }

    /// File registered under `name`, as listed in the request
    pub fn lookup_file(&self, name: &str) -> Result<&FileDescriptor, GeneratorError> {
        self.files.get(name).ok_or_else(|| {
            GeneratorError::SchemaLookup(format!("no file named {:?} in the registry", name))
        })
    }

    /// Message by fully-qualified name, with or without a leading dot
    pub fn lookup_message(&self, full_name: &str) -> Option<&MessageType> {
        self.messages.get(full_name.trim_start_matches('.'))
    }

    /// Enum by fully-qualified name, with or without a leading dot
    pub fn lookup_enum(&self, full_name: &str) -> Option<&EnumType> {
        self.enums.get(full_name.trim_start_matches('.'))
    }

    /// Service by fully-qualified name, with or without a leading dot
    pub fn lookup_service(&self, full_name: &str) -> Option<&Service> {
        self.services.get(full_name.trim_start_matches('.'))
    }

    /// Linked descriptor pool built from the same files
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType, Label};

    fn sample_files() -> Vec<FileDescriptor> {
        let common = FileDescriptor {
            name: Some("common.proto".to_string()),
            package: Some("acme.common".to_string()),
            message_type: vec![MessageType {
                name: Some("Money".to_string()),
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };
        let shop = FileDescriptor {
            name: Some("shop.proto".to_string()),
            package: Some("acme.shop".to_string()),
            dependency: vec!["common.proto".to_string()],
            message_type: vec![MessageType {
                name: Some("Order".to_string()),
                field: vec![Field {
                    name: Some("total".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional),
                    r#type: Some(FieldType::Message),
                    type_name: Some(".acme.common.Money".to_string()),
                    ..Default::default()
                }],
                nested_type: vec![MessageType {
                    name: Some("Line".to_string()),
                    ..Default::default()
                }],
                enum_type: vec![EnumType {
                    name: Some("State".to_string()),
                    value: vec![crate::schema::EnumValue {
                        name: Some("STATE_UNSPECIFIED".to_string()),
                        number: Some(0),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            service: vec![Service {
                name: Some("Shop".to_string()),
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };
        vec![common, shop]
    }

    #[test]
    fn test_lookup_by_full_name() {
        let registry = Registry::load(&sample_files()).unwrap();

        assert!(registry.lookup_message(".acme.common.Money").is_some());
        assert!(registry.lookup_message("acme.shop.Order.Line").is_some());
        assert!(registry.lookup_enum(".acme.shop.Order.State").is_some());
        assert!(registry.lookup_service("acme.shop.Shop").is_some());
        assert!(registry.lookup_message("acme.shop.Missing").is_none());
    }

    #[test]
    fn test_lookup_file() {
        let registry = Registry::load(&sample_files()).unwrap();

        assert_eq!(registry.lookup_file("shop.proto").unwrap().package(), "acme.shop");
        let err = registry.lookup_file("missing.proto").unwrap_err();
        assert!(matches!(err, GeneratorError::SchemaLookup(_)));
    }

    #[test]
    fn test_pool_links_references() {
        let registry = Registry::load(&sample_files()).unwrap();

        let order = registry.pool().get_message_by_name("acme.shop.Order").unwrap();
        let total = order.get_field_by_name("total").unwrap();
        let money = total.kind();
        assert_eq!(money.as_message().unwrap().full_name(), "acme.common.Money");
    }

    #[test]
    fn test_missing_import_is_an_error() {
        let files = sample_files().split_off(1);
        let err = Registry::load(&files).unwrap_err();
        assert!(matches!(err, GeneratorError::Registry(_)));
    }

    #[test]
    fn test_files_keep_request_order() {
        let registry = Registry::load(&sample_files()).unwrap();
        let names: Vec<&str> = registry.files.keys().map(String::as_str).collect();
        assert_eq!(names, ["common.proto", "shop.proto"]);
    }
}
