//! Adapter between `prost-types` descriptors and the canonical model
//!
//! `prost` drops unknown fields while decoding, so descriptors imported here
//! carry empty [`UnknownFields`] and exporting discards whatever unknown bytes
//! a model node holds. Use [`super::dynamic`] when those bytes matter.

use crate::schema::{
    CType, EnumOptions, EnumReservedRange, EnumType, EnumValue, EnumValueOptions,
    ExtensionRange, ExtensionRangeOptions, Field, FieldOptions, FieldType, FileDescriptor,
    FileOptions, IdempotencyLevel, JsType, Label, Location, MessageOptions, MessageType, Method,
    MethodOptions, NamePart, Oneof, OneofOptions, OptimizeMode, OptionValue, ReservedRange,
    Service, ServiceOptions, SourceCodeInfo, UninterpretedOption, UnknownFields,
};
use prost_types::descriptor_proto;
use prost_types::enum_descriptor_proto;
use prost_types::source_code_info;
use prost_types::uninterpreted_option;

/// Import every file of a request, keeping request order
pub fn import_request_files(files: &[prost_types::FileDescriptorProto]) -> Vec<FileDescriptor> {
    files.iter().map(import_file).collect()
}

/// Convert a `prost-types` file descriptor into the canonical model
pub fn import_file(file: &prost_types::FileDescriptorProto) -> FileDescriptor {
    FileDescriptor {
        name: file.name.clone(),
        package: file.package.clone(),
        dependency: file.dependency.clone(),
        public_dependency: file.public_dependency.clone(),
        weak_dependency: file.weak_dependency.clone(),
        message_type: file.message_type.iter().map(import_message).collect(),
        enum_type: file.enum_type.iter().map(import_enum).collect(),
        service: file.service.iter().map(import_service).collect(),
        extension: file.extension.iter().map(import_field).collect(),
        options: file.options.as_ref().map(import_file_options),
        source_code_info: file.source_code_info.as_ref().map(import_source_code_info),
        syntax: file.syntax.clone(),
        unknown_fields: UnknownFields::default(),
    }
}

/// Convert a canonical file back into a `prost-types` descriptor
pub fn export_file(file: &FileDescriptor) -> prost_types::FileDescriptorProto {
    prost_types::FileDescriptorProto {
        name: file.name.clone(),
        package: file.package.clone(),
        dependency: file.dependency.clone(),
        public_dependency: file.public_dependency.clone(),
        weak_dependency: file.weak_dependency.clone(),
        message_type: file.message_type.iter().map(export_message).collect(),
        enum_type: file.enum_type.iter().map(export_enum).collect(),
        service: file.service.iter().map(export_service).collect(),
        extension: file.extension.iter().map(export_field).collect(),
        options: file.options.as_ref().map(export_file_options),
        source_code_info: file.source_code_info.as_ref().map(export_source_code_info),
        syntax: file.syntax.clone(),
        ..Default::default()
    }
}

// =============================================================================
// Messages and fields
// =============================================================================

fn import_message(msg: &prost_types::DescriptorProto) -> MessageType {
    MessageType {
        name: msg.name.clone(),
        field: msg.field.iter().map(import_field).collect(),
        extension: msg.extension.iter().map(import_field).collect(),
        nested_type: msg.nested_type.iter().map(import_message).collect(),
        enum_type: msg.enum_type.iter().map(import_enum).collect(),
        extension_range: msg
            .extension_range
            .iter()
            .map(|range| ExtensionRange {
                start: range.start,
                end: range.end,
                options: range.options.as_ref().map(|opts| ExtensionRangeOptions {
                    uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
                    unknown_fields: UnknownFields::default(),
                }),
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        oneof_decl: msg
            .oneof_decl
            .iter()
            .map(|oneof| Oneof {
                name: oneof.name.clone(),
                options: oneof.options.as_ref().map(|opts| OneofOptions {
                    uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
                    unknown_fields: UnknownFields::default(),
                }),
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        options: msg.options.as_ref().map(|opts| MessageOptions {
            message_set_wire_format: opts.message_set_wire_format,
            no_standard_descriptor_accessor: opts.no_standard_descriptor_accessor,
            deprecated: opts.deprecated,
            map_entry: opts.map_entry,
            uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
            unknown_fields: UnknownFields::default(),
        }),
        reserved_range: msg
            .reserved_range
            .iter()
            .map(|range| ReservedRange {
                start: range.start,
                end: range.end,
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        reserved_name: msg.reserved_name.clone(),
        unknown_fields: UnknownFields::default(),
    }
}

fn export_message(msg: &MessageType) -> prost_types::DescriptorProto {
    prost_types::DescriptorProto {
        name: msg.name.clone(),
        field: msg.field.iter().map(export_field).collect(),
        extension: msg.extension.iter().map(export_field).collect(),
        nested_type: msg.nested_type.iter().map(export_message).collect(),
        enum_type: msg.enum_type.iter().map(export_enum).collect(),
        extension_range: msg
            .extension_range
            .iter()
            .map(|range| descriptor_proto::ExtensionRange {
                start: range.start,
                end: range.end,
                options: range
                    .options
                    .as_ref()
                    .map(|opts| prost_types::ExtensionRangeOptions {
                        uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                        ..Default::default()
                    }),
            })
            .collect(),
        oneof_decl: msg
            .oneof_decl
            .iter()
            .map(|oneof| prost_types::OneofDescriptorProto {
                name: oneof.name.clone(),
                options: oneof
                    .options
                    .as_ref()
                    .map(|opts| prost_types::OneofOptions {
                        uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                        ..Default::default()
                    }),
            })
            .collect(),
        options: msg
            .options
            .as_ref()
            .map(|opts| prost_types::MessageOptions {
                message_set_wire_format: opts.message_set_wire_format,
                no_standard_descriptor_accessor: opts.no_standard_descriptor_accessor,
                deprecated: opts.deprecated,
                map_entry: opts.map_entry,
                uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                ..Default::default()
            }),
        reserved_range: msg
            .reserved_range
            .iter()
            .map(|range| descriptor_proto::ReservedRange {
                start: range.start,
                end: range.end,
            })
            .collect(),
        reserved_name: msg.reserved_name.clone(),
    }
}

fn import_field(field: &prost_types::FieldDescriptorProto) -> Field {
    Field {
        name: field.name.clone(),
        number: field.number,
        label: field.label.map(Label::from_number),
        r#type: field.r#type.map(FieldType::from_number),
        type_name: field.type_name.clone(),
        extendee: field.extendee.clone(),
        default_value: field.default_value.clone(),
        oneof_index: field.oneof_index,
        json_name: field.json_name.clone(),
        options: field.options.as_ref().map(|opts| FieldOptions {
            ctype: opts.ctype.map(CType::from_number),
            packed: opts.packed,
            jstype: opts.jstype.map(JsType::from_number),
            lazy: opts.lazy,
            deprecated: opts.deprecated,
            weak: opts.weak,
            uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
            unknown_fields: UnknownFields::default(),
        }),
        proto3_optional: field.proto3_optional,
        unknown_fields: UnknownFields::default(),
    }
}

fn export_field(field: &Field) -> prost_types::FieldDescriptorProto {
    prost_types::FieldDescriptorProto {
        name: field.name.clone(),
        number: field.number,
        label: field.label.map(Label::number),
        r#type: field.r#type.map(FieldType::number),
        type_name: field.type_name.clone(),
        extendee: field.extendee.clone(),
        default_value: field.default_value.clone(),
        oneof_index: field.oneof_index,
        json_name: field.json_name.clone(),
        options: field
            .options
            .as_ref()
            .map(|opts| prost_types::FieldOptions {
                ctype: opts.ctype.map(CType::number),
                packed: opts.packed,
                jstype: opts.jstype.map(JsType::number),
                lazy: opts.lazy,
                deprecated: opts.deprecated,
                weak: opts.weak,
                uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                ..Default::default()
            }),
        proto3_optional: field.proto3_optional,
    }
}

// =============================================================================
// Enums
// =============================================================================

fn import_enum(desc: &prost_types::EnumDescriptorProto) -> EnumType {
    EnumType {
        name: desc.name.clone(),
        value: desc
            .value
            .iter()
            .map(|value| EnumValue {
                name: value.name.clone(),
                number: value.number,
                options: value.options.as_ref().map(|opts| EnumValueOptions {
                    deprecated: opts.deprecated,
                    uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
                    unknown_fields: UnknownFields::default(),
                }),
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        options: desc.options.as_ref().map(|opts| EnumOptions {
            allow_alias: opts.allow_alias,
            deprecated: opts.deprecated,
            uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
            unknown_fields: UnknownFields::default(),
        }),
        reserved_range: desc
            .reserved_range
            .iter()
            .map(|range| EnumReservedRange {
                start: range.start,
                end: range.end,
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        reserved_name: desc.reserved_name.clone(),
        unknown_fields: UnknownFields::default(),
    }
}

fn export_enum(desc: &EnumType) -> prost_types::EnumDescriptorProto {
    prost_types::EnumDescriptorProto {
        name: desc.name.clone(),
        value: desc
            .value
            .iter()
            .map(|value| prost_types::EnumValueDescriptorProto {
                name: value.name.clone(),
                number: value.number,
                options: value
                    .options
                    .as_ref()
                    .map(|opts| prost_types::EnumValueOptions {
                        deprecated: opts.deprecated,
                        uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                        ..Default::default()
                    }),
            })
            .collect(),
        options: desc.options.as_ref().map(|opts| prost_types::EnumOptions {
            allow_alias: opts.allow_alias,
            deprecated: opts.deprecated,
            uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
            ..Default::default()
        }),
        reserved_range: desc
            .reserved_range
            .iter()
            .map(|range| enum_descriptor_proto::EnumReservedRange {
                start: range.start,
                end: range.end,
            })
            .collect(),
        reserved_name: desc.reserved_name.clone(),
    }
}

// =============================================================================
// Services
// =============================================================================

fn import_service(service: &prost_types::ServiceDescriptorProto) -> Service {
    Service {
        name: service.name.clone(),
        method: service
            .method
            .iter()
            .map(|method| Method {
                name: method.name.clone(),
                input_type: method.input_type.clone(),
                output_type: method.output_type.clone(),
                options: method.options.as_ref().map(|opts| MethodOptions {
                    deprecated: opts.deprecated,
                    idempotency_level: opts.idempotency_level.map(IdempotencyLevel::from_number),
                    uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
                    unknown_fields: UnknownFields::default(),
                }),
                client_streaming: method.client_streaming,
                server_streaming: method.server_streaming,
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        options: service.options.as_ref().map(|opts| ServiceOptions {
            deprecated: opts.deprecated,
            uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
            unknown_fields: UnknownFields::default(),
        }),
        unknown_fields: UnknownFields::default(),
    }
}

fn export_service(service: &Service) -> prost_types::ServiceDescriptorProto {
    prost_types::ServiceDescriptorProto {
        name: service.name.clone(),
        method: service
            .method
            .iter()
            .map(|method| prost_types::MethodDescriptorProto {
                name: method.name.clone(),
                input_type: method.input_type.clone(),
                output_type: method.output_type.clone(),
                options: method
                    .options
                    .as_ref()
                    .map(|opts| prost_types::MethodOptions {
                        deprecated: opts.deprecated,
                        idempotency_level: opts.idempotency_level.map(IdempotencyLevel::number),
                        uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                        ..Default::default()
                    }),
                client_streaming: method.client_streaming,
                server_streaming: method.server_streaming,
            })
            .collect(),
        options: service
            .options
            .as_ref()
            .map(|opts| prost_types::ServiceOptions {
                deprecated: opts.deprecated,
                uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
                ..Default::default()
            }),
    }
}

// =============================================================================
// File options and source info
// =============================================================================

#[allow(deprecated)]
fn import_file_options(opts: &prost_types::FileOptions) -> FileOptions {
    FileOptions {
        java_package: opts.java_package.clone(),
        java_outer_classname: opts.java_outer_classname.clone(),
        java_multiple_files: opts.java_multiple_files,
        java_generate_equals_and_hash: opts.java_generate_equals_and_hash,
        java_string_check_utf8: opts.java_string_check_utf8,
        optimize_for: opts.optimize_for.map(OptimizeMode::from_number),
        go_package: opts.go_package.clone(),
        cc_generic_services: opts.cc_generic_services,
        java_generic_services: opts.java_generic_services,
        py_generic_services: opts.py_generic_services,
        deprecated: opts.deprecated,
        cc_enable_arenas: opts.cc_enable_arenas,
        objc_class_prefix: opts.objc_class_prefix.clone(),
        csharp_namespace: opts.csharp_namespace.clone(),
        swift_prefix: opts.swift_prefix.clone(),
        php_class_prefix: opts.php_class_prefix.clone(),
        php_namespace: opts.php_namespace.clone(),
        php_metadata_namespace: opts.php_metadata_namespace.clone(),
        ruby_package: opts.ruby_package.clone(),
        uninterpreted_option: import_uninterpreted(&opts.uninterpreted_option),
        unknown_fields: UnknownFields::default(),
    }
}

#[allow(deprecated)]
fn export_file_options(opts: &FileOptions) -> prost_types::FileOptions {
    prost_types::FileOptions {
        java_package: opts.java_package.clone(),
        java_outer_classname: opts.java_outer_classname.clone(),
        java_multiple_files: opts.java_multiple_files,
        java_generate_equals_and_hash: opts.java_generate_equals_and_hash,
        java_string_check_utf8: opts.java_string_check_utf8,
        optimize_for: opts.optimize_for.map(OptimizeMode::number),
        go_package: opts.go_package.clone(),
        cc_generic_services: opts.cc_generic_services,
        java_generic_services: opts.java_generic_services,
        py_generic_services: opts.py_generic_services,
        deprecated: opts.deprecated,
        cc_enable_arenas: opts.cc_enable_arenas,
        objc_class_prefix: opts.objc_class_prefix.clone(),
        csharp_namespace: opts.csharp_namespace.clone(),
        swift_prefix: opts.swift_prefix.clone(),
        php_class_prefix: opts.php_class_prefix.clone(),
        php_namespace: opts.php_namespace.clone(),
        php_metadata_namespace: opts.php_metadata_namespace.clone(),
        ruby_package: opts.ruby_package.clone(),
        uninterpreted_option: export_uninterpreted(&opts.uninterpreted_option),
        ..Default::default()
    }
}

fn import_source_code_info(info: &prost_types::SourceCodeInfo) -> SourceCodeInfo {
    SourceCodeInfo {
        location: info
            .location
            .iter()
            .map(|loc| Location {
                path: loc.path.clone(),
                span: loc.span.clone(),
                leading_comments: loc.leading_comments.clone(),
                trailing_comments: loc.trailing_comments.clone(),
                leading_detached_comments: loc.leading_detached_comments.clone(),
                unknown_fields: UnknownFields::default(),
            })
            .collect(),
        unknown_fields: UnknownFields::default(),
    }
}

fn export_source_code_info(info: &SourceCodeInfo) -> prost_types::SourceCodeInfo {
    prost_types::SourceCodeInfo {
        location: info
            .location
            .iter()
            .map(|loc| source_code_info::Location {
                path: loc.path.clone(),
                span: loc.span.clone(),
                leading_comments: loc.leading_comments.clone(),
                trailing_comments: loc.trailing_comments.clone(),
                leading_detached_comments: loc.leading_detached_comments.clone(),
            })
            .collect(),
    }
}

// =============================================================================
// Uninterpreted options
// =============================================================================

fn import_uninterpreted(opts: &[prost_types::UninterpretedOption]) -> Vec<UninterpretedOption> {
    opts.iter()
        .map(|opt| UninterpretedOption {
            name: opt
                .name
                .iter()
                .map(|part| NamePart {
                    name_part: part.name_part.clone(),
                    is_extension: part.is_extension,
                    unknown_fields: UnknownFields::default(),
                })
                .collect(),
            value: import_option_value(opt),
            unknown_fields: UnknownFields::default(),
        })
        .collect()
}

/// Pick the populated value slot, first in declaration order
fn import_option_value(opt: &prost_types::UninterpretedOption) -> Option<OptionValue> {
    if let Some(ref ident) = opt.identifier_value {
        return Some(OptionValue::Identifier(ident.clone()));
    }
    if let Some(n) = opt.positive_int_value {
        return Some(OptionValue::PositiveInt(n));
    }
    if let Some(n) = opt.negative_int_value {
        return Some(OptionValue::NegativeInt(n));
    }
    if let Some(d) = opt.double_value {
        return Some(OptionValue::Double(d));
    }
    if let Some(ref s) = opt.string_value {
        return Some(OptionValue::String(s.clone()));
    }
    opt.aggregate_value.clone().map(OptionValue::Aggregate)
}

fn export_uninterpreted(opts: &[UninterpretedOption]) -> Vec<prost_types::UninterpretedOption> {
    opts.iter()
        .map(|opt| {
            let mut out = prost_types::UninterpretedOption {
                name: opt
                    .name
                    .iter()
                    .map(|part| uninterpreted_option::NamePart {
                        name_part: part.name_part.clone(),
                        is_extension: part.is_extension,
                    })
                    .collect(),
                ..Default::default()
            };
            match &opt.value {
                Some(OptionValue::Identifier(ident)) => out.identifier_value = Some(ident.clone()),
                Some(OptionValue::PositiveInt(n)) => out.positive_int_value = Some(*n),
                Some(OptionValue::NegativeInt(n)) => out.negative_int_value = Some(*n),
                Some(OptionValue::Double(d)) => out.double_value = Some(*d),
                Some(OptionValue::String(s)) => out.string_value = Some(s.clone()),
                Some(OptionValue::Aggregate(a)) => out.aggregate_value = Some(a.clone()),
                None => {}
            }
            out
        })
        .collect()
}
