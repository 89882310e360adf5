//! Boundary adapters between descriptor representations
//!
//! The plugin protocol hands descriptors over as `prost-types` structs while
//! the registry works on `prost-reflect` dynamic messages. Both convert to and
//! from the canonical [`crate::schema`] model; nothing else in the crate
//! touches either representation directly.
//!
//! Conversions are pure structural mappings. They never validate and never
//! fail: a malformed source tree produces an equally malformed result.

pub mod dynamic;
pub mod prost;

use prost_reflect::DynamicMessage;

/// `descriptor.proto` fields the `prost-types` adapter cannot carry
///
/// `prost-types` 0.13 either lacks these fields or decodes them into types the
/// canonical model does not mirror. The [`dynamic`] adapter keeps them inside
/// each node's unknown bytes instead.
pub const UNSUPPORTED_FIELDS: &[&str] = &[
    "google.protobuf.FileDescriptorProto.edition",
    "google.protobuf.FileOptions.php_generic_services",
    "google.protobuf.FileOptions.features",
    "google.protobuf.MessageOptions.deprecated_legacy_json_field_conflicts",
    "google.protobuf.MessageOptions.features",
    "google.protobuf.FieldOptions.unverified_lazy",
    "google.protobuf.FieldOptions.debug_redact",
    "google.protobuf.FieldOptions.retention",
    "google.protobuf.FieldOptions.targets",
    "google.protobuf.FieldOptions.edition_defaults",
    "google.protobuf.FieldOptions.features",
    "google.protobuf.FieldOptions.feature_support",
    "google.protobuf.OneofOptions.features",
    "google.protobuf.EnumOptions.deprecated_legacy_json_field_conflicts",
    "google.protobuf.EnumOptions.features",
    "google.protobuf.EnumValueOptions.features",
    "google.protobuf.EnumValueOptions.debug_redact",
    "google.protobuf.EnumValueOptions.feature_support",
    "google.protobuf.ServiceOptions.features",
    "google.protobuf.MethodOptions.features",
    "google.protobuf.ExtensionRangeOptions.declaration",
    "google.protobuf.ExtensionRangeOptions.verification",
    "google.protobuf.ExtensionRangeOptions.features",
];

/// Convert a `prost-types` file descriptor into a dynamic message
pub fn prost_to_dynamic(file: &prost_types::FileDescriptorProto) -> DynamicMessage {
    let model = prost::import_file(file);
    dynamic::export_file(&dynamic::file_descriptor_type(), &model)
}

/// Convert a dynamic file descriptor into a `prost-types` descriptor
///
/// Unknown bytes held by the dynamic message are dropped.
pub fn dynamic_to_prost(file: &DynamicMessage) -> prost_types::FileDescriptorProto {
    prost::export_file(&dynamic::import_file(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_fields_are_unique() {
        let mut names = UNSUPPORTED_FIELDS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), UNSUPPORTED_FIELDS.len());
    }

    #[test]
    fn test_cross_conversion_keeps_services() {
        let file = prost_types::FileDescriptorProto {
            name: Some("svc.proto".to_string()),
            package: Some("svc".to_string()),
            service: vec![prost_types::ServiceDescriptorProto {
                name: Some("Greeter".to_string()),
                method: vec![prost_types::MethodDescriptorProto {
                    name: Some("Hello".to_string()),
                    input_type: Some(".svc.Req".to_string()),
                    output_type: Some(".svc.Resp".to_string()),
                    server_streaming: Some(true),
                    ..Default::default()
                }],
                options: None,
            }],
            ..Default::default()
        };

        let back = dynamic_to_prost(&prost_to_dynamic(&file));
        assert_eq!(back, file);
    }
}
