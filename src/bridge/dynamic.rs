//! Adapter between `prost-reflect` dynamic descriptors and the canonical model
//!
//! A [`DynamicMessage`] keeps every field it decoded, including field numbers
//! its descriptor does not know. On import, each node's
//! [`UnknownFields`] receives the encoding of every field this adapter does
//! not map: unknown numbers, extensions, and newer `descriptor.proto` fields.
//! On export, those bytes are merged back into the rebuilt node, so
//! bytes → model → bytes keeps them intact.

use crate::schema::{
    CType, EnumOptions, EnumReservedRange, EnumType, EnumValue, EnumValueOptions,
    ExtensionRange, ExtensionRangeOptions, Field, FieldOptions, FieldType, FileDescriptor,
    FileOptions, IdempotencyLevel, JsType, Label, Location, MessageOptions, MessageType, Method,
    MethodOptions, NamePart, Oneof, OneofOptions, OptimizeMode, OptionValue, ReservedRange,
    Service, ServiceOptions, SourceCodeInfo, UninterpretedOption, UnknownFields,
};
use crate::GeneratorError;
use once_cell::sync::Lazy;
use prost::bytes::Bytes;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage, Value};

static FILE_DESCRIPTOR_PROTO: Lazy<MessageDescriptor> =
    Lazy::new(|| prost_types::FileDescriptorProto::default().descriptor());

const FILE_FIELDS: &[&str] = &[
    "name",
    "package",
    "dependency",
    "public_dependency",
    "weak_dependency",
    "message_type",
    "enum_type",
    "service",
    "extension",
    "options",
    "source_code_info",
    "syntax",
];
const MESSAGE_FIELDS: &[&str] = &[
    "name",
    "field",
    "extension",
    "nested_type",
    "enum_type",
    "extension_range",
    "oneof_decl",
    "options",
    "reserved_range",
    "reserved_name",
];
const FIELD_FIELDS: &[&str] = &[
    "name",
    "number",
    "label",
    "type",
    "type_name",
    "extendee",
    "default_value",
    "oneof_index",
    "json_name",
    "options",
    "proto3_optional",
];
const RANGE_FIELDS: &[&str] = &["start", "end"];
const EXTENSION_RANGE_FIELDS: &[&str] = &["start", "end", "options"];
const NAMED_FIELDS: &[&str] = &["name", "options"];
const ENUM_FIELDS: &[&str] = &["name", "value", "options", "reserved_range", "reserved_name"];
const ENUM_VALUE_FIELDS: &[&str] = &["name", "number", "options"];
const SERVICE_FIELDS: &[&str] = &["name", "method", "options"];
const METHOD_FIELDS: &[&str] = &[
    "name",
    "input_type",
    "output_type",
    "options",
    "client_streaming",
    "server_streaming",
];
const FILE_OPTION_FIELDS: &[&str] = &[
    "java_package",
    "java_outer_classname",
    "java_multiple_files",
    "java_generate_equals_and_hash",
    "java_string_check_utf8",
    "optimize_for",
    "go_package",
    "cc_generic_services",
    "java_generic_services",
    "py_generic_services",
    "deprecated",
    "cc_enable_arenas",
    "objc_class_prefix",
    "csharp_namespace",
    "swift_prefix",
    "php_class_prefix",
    "php_namespace",
    "php_metadata_namespace",
    "ruby_package",
    "uninterpreted_option",
];
const MESSAGE_OPTION_FIELDS: &[&str] = &[
    "message_set_wire_format",
    "no_standard_descriptor_accessor",
    "deprecated",
    "map_entry",
    "uninterpreted_option",
];
const FIELD_OPTION_FIELDS: &[&str] = &[
    "ctype",
    "packed",
    "jstype",
    "lazy",
    "deprecated",
    "weak",
    "uninterpreted_option",
];
const ENUM_OPTION_FIELDS: &[&str] = &["allow_alias", "deprecated", "uninterpreted_option"];
const DEPRECATED_OPTION_FIELDS: &[&str] = &["deprecated", "uninterpreted_option"];
const METHOD_OPTION_FIELDS: &[&str] = &["deprecated", "idempotency_level", "uninterpreted_option"];
const PLAIN_OPTION_FIELDS: &[&str] = &["uninterpreted_option"];
const NAME_PART_FIELDS: &[&str] = &["name_part", "is_extension"];
const SOURCE_CODE_INFO_FIELDS: &[&str] = &["location"];
const LOCATION_FIELDS: &[&str] = &[
    "path",
    "span",
    "leading_comments",
    "trailing_comments",
    "leading_detached_comments",
];

/// The `google.protobuf.FileDescriptorProto` message type
pub fn file_descriptor_type() -> MessageDescriptor {
    FILE_DESCRIPTOR_PROTO.clone()
}

/// Decode an encoded `FileDescriptorProto` into the canonical model
pub fn decode_file(bytes: &[u8]) -> Result<FileDescriptor, GeneratorError> {
    let msg = DynamicMessage::decode(file_descriptor_type(), bytes)
        .map_err(|e| GeneratorError::DecodeError(format!("FileDescriptorProto: {}", e)))?;
    Ok(import_file(&msg))
}

/// Encode a canonical file as a `FileDescriptorProto`, unknown fields included
pub fn encode_file(file: &FileDescriptor) -> Vec<u8> {
    export_file(&file_descriptor_type(), file).encode_to_vec()
}

// =============================================================================
// Import
// =============================================================================

/// Convert a dynamic `FileDescriptorProto` into the canonical model
pub fn import_file(msg: &DynamicMessage) -> FileDescriptor {
    FileDescriptor {
        name: string(msg, "name"),
        package: string(msg, "package"),
        dependency: list(msg, "dependency", |v| v.as_str().map(str::to_owned)),
        public_dependency: list(msg, "public_dependency", Value::as_i32),
        weak_dependency: list(msg, "weak_dependency", Value::as_i32),
        message_type: messages(msg, "message_type", import_message),
        enum_type: messages(msg, "enum_type", import_enum),
        service: messages(msg, "service", import_service),
        extension: messages(msg, "extension", import_field),
        options: message(msg, "options", import_file_options),
        source_code_info: message(msg, "source_code_info", import_source_code_info),
        syntax: string(msg, "syntax"),
        unknown_fields: unknown(msg, FILE_FIELDS),
    }
}

fn import_message(msg: &DynamicMessage) -> MessageType {
    MessageType {
        name: string(msg, "name"),
        field: messages(msg, "field", import_field),
        extension: messages(msg, "extension", import_field),
        nested_type: messages(msg, "nested_type", import_message),
        enum_type: messages(msg, "enum_type", import_enum),
        extension_range: messages(msg, "extension_range", |range| ExtensionRange {
            start: int32(range, "start"),
            end: int32(range, "end"),
            options: message(range, "options", |opts| ExtensionRangeOptions {
                uninterpreted_option: uninterpreted(opts),
                unknown_fields: unknown(opts, PLAIN_OPTION_FIELDS),
            }),
            unknown_fields: unknown(range, EXTENSION_RANGE_FIELDS),
        }),
        oneof_decl: messages(msg, "oneof_decl", |oneof| Oneof {
            name: string(oneof, "name"),
            options: message(oneof, "options", |opts| OneofOptions {
                uninterpreted_option: uninterpreted(opts),
                unknown_fields: unknown(opts, PLAIN_OPTION_FIELDS),
            }),
            unknown_fields: unknown(oneof, NAMED_FIELDS),
        }),
        options: message(msg, "options", |opts| MessageOptions {
            message_set_wire_format: boolean(opts, "message_set_wire_format"),
            no_standard_descriptor_accessor: boolean(opts, "no_standard_descriptor_accessor"),
            deprecated: boolean(opts, "deprecated"),
            map_entry: boolean(opts, "map_entry"),
            uninterpreted_option: uninterpreted(opts),
            unknown_fields: unknown(opts, MESSAGE_OPTION_FIELDS),
        }),
        reserved_range: messages(msg, "reserved_range", |range| ReservedRange {
            start: int32(range, "start"),
            end: int32(range, "end"),
            unknown_fields: unknown(range, RANGE_FIELDS),
        }),
        reserved_name: list(msg, "reserved_name", |v| v.as_str().map(str::to_owned)),
        unknown_fields: unknown(msg, MESSAGE_FIELDS),
    }
}

fn import_field(msg: &DynamicMessage) -> Field {
    Field {
        name: string(msg, "name"),
        number: int32(msg, "number"),
        label: enum_number(msg, "label").map(Label::from_number),
        r#type: enum_number(msg, "type").map(FieldType::from_number),
        type_name: string(msg, "type_name"),
        extendee: string(msg, "extendee"),
        default_value: string(msg, "default_value"),
        oneof_index: int32(msg, "oneof_index"),
        json_name: string(msg, "json_name"),
        options: message(msg, "options", |opts| FieldOptions {
            ctype: enum_number(opts, "ctype").map(CType::from_number),
            packed: boolean(opts, "packed"),
            jstype: enum_number(opts, "jstype").map(JsType::from_number),
            lazy: boolean(opts, "lazy"),
            deprecated: boolean(opts, "deprecated"),
            weak: boolean(opts, "weak"),
            uninterpreted_option: uninterpreted(opts),
            unknown_fields: unknown(opts, FIELD_OPTION_FIELDS),
        }),
        proto3_optional: boolean(msg, "proto3_optional"),
        unknown_fields: unknown(msg, FIELD_FIELDS),
    }
}

fn import_enum(msg: &DynamicMessage) -> EnumType {
    EnumType {
        name: string(msg, "name"),
        value: messages(msg, "value", |value| EnumValue {
            name: string(value, "name"),
            number: int32(value, "number"),
            options: message(value, "options", |opts| EnumValueOptions {
                deprecated: boolean(opts, "deprecated"),
                uninterpreted_option: uninterpreted(opts),
                unknown_fields: unknown(opts, DEPRECATED_OPTION_FIELDS),
            }),
            unknown_fields: unknown(value, ENUM_VALUE_FIELDS),
        }),
        options: message(msg, "options", |opts| EnumOptions {
            allow_alias: boolean(opts, "allow_alias"),
            deprecated: boolean(opts, "deprecated"),
            uninterpreted_option: uninterpreted(opts),
            unknown_fields: unknown(opts, ENUM_OPTION_FIELDS),
        }),
        reserved_range: messages(msg, "reserved_range", |range| EnumReservedRange {
            start: int32(range, "start"),
            end: int32(range, "end"),
            unknown_fields: unknown(range, RANGE_FIELDS),
        }),
        reserved_name: list(msg, "reserved_name", |v| v.as_str().map(str::to_owned)),
        unknown_fields: unknown(msg, ENUM_FIELDS),
    }
}

fn import_service(msg: &DynamicMessage) -> Service {
    Service {
        name: string(msg, "name"),
        method: messages(msg, "method", |method| Method {
            name: string(method, "name"),
            input_type: string(method, "input_type"),
            output_type: string(method, "output_type"),
            options: message(method, "options", |opts| MethodOptions {
                deprecated: boolean(opts, "deprecated"),
                idempotency_level: enum_number(opts, "idempotency_level")
                    .map(IdempotencyLevel::from_number),
                uninterpreted_option: uninterpreted(opts),
                unknown_fields: unknown(opts, METHOD_OPTION_FIELDS),
            }),
            client_streaming: boolean(method, "client_streaming"),
            server_streaming: boolean(method, "server_streaming"),
            unknown_fields: unknown(method, METHOD_FIELDS),
        }),
        options: message(msg, "options", |opts| ServiceOptions {
            deprecated: boolean(opts, "deprecated"),
            uninterpreted_option: uninterpreted(opts),
            unknown_fields: unknown(opts, DEPRECATED_OPTION_FIELDS),
        }),
        unknown_fields: unknown(msg, SERVICE_FIELDS),
    }
}

fn import_file_options(opts: &DynamicMessage) -> FileOptions {
    FileOptions {
        java_package: string(opts, "java_package"),
        java_outer_classname: string(opts, "java_outer_classname"),
        java_multiple_files: boolean(opts, "java_multiple_files"),
        java_generate_equals_and_hash: boolean(opts, "java_generate_equals_and_hash"),
        java_string_check_utf8: boolean(opts, "java_string_check_utf8"),
        optimize_for: enum_number(opts, "optimize_for").map(OptimizeMode::from_number),
        go_package: string(opts, "go_package"),
        cc_generic_services: boolean(opts, "cc_generic_services"),
        java_generic_services: boolean(opts, "java_generic_services"),
        py_generic_services: boolean(opts, "py_generic_services"),
        deprecated: boolean(opts, "deprecated"),
        cc_enable_arenas: boolean(opts, "cc_enable_arenas"),
        objc_class_prefix: string(opts, "objc_class_prefix"),
        csharp_namespace: string(opts, "csharp_namespace"),
        swift_prefix: string(opts, "swift_prefix"),
        php_class_prefix: string(opts, "php_class_prefix"),
        php_namespace: string(opts, "php_namespace"),
        php_metadata_namespace: string(opts, "php_metadata_namespace"),
        ruby_package: string(opts, "ruby_package"),
        uninterpreted_option: uninterpreted(opts),
        unknown_fields: unknown(opts, FILE_OPTION_FIELDS),
    }
}

fn import_source_code_info(msg: &DynamicMessage) -> SourceCodeInfo {
    SourceCodeInfo {
        location: messages(msg, "location", |loc| Location {
            path: list(loc, "path", Value::as_i32),
            span: list(loc, "span", Value::as_i32),
            leading_comments: string(loc, "leading_comments"),
            trailing_comments: string(loc, "trailing_comments"),
            leading_detached_comments: list(loc, "leading_detached_comments", |v| {
                v.as_str().map(str::to_owned)
            }),
            unknown_fields: unknown(loc, LOCATION_FIELDS),
        }),
        unknown_fields: unknown(msg, SOURCE_CODE_INFO_FIELDS),
    }
}

fn uninterpreted(opts: &DynamicMessage) -> Vec<UninterpretedOption> {
    messages(opts, "uninterpreted_option", |opt| {
        let (value, slot) = match option_value(opt) {
            Some((value, slot)) => (Some(value), Some(slot)),
            None => (None, None),
        };
        // Slots other than the one picked stay behind in the unknown bytes.
        let mut mapped = vec!["name"];
        mapped.extend(slot);
        UninterpretedOption {
            name: messages(opt, "name", |part| NamePart {
                name_part: part
                    .get_field_by_name("name_part")
                    .as_deref()
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_default(),
                is_extension: part
                    .get_field_by_name("is_extension")
                    .as_deref()
                    .and_then(Value::as_bool)
                    .unwrap_or_default(),
                unknown_fields: unknown(part, NAME_PART_FIELDS),
            }),
            value,
            unknown_fields: unknown(opt, &mapped),
        }
    })
}

/// The first populated value slot, in declaration order
fn option_value(opt: &DynamicMessage) -> Option<(OptionValue, &'static str)> {
    if let Some(ident) = string(opt, "identifier_value") {
        return Some((OptionValue::Identifier(ident), "identifier_value"));
    }
    if let Some(n) = scalar(opt, "positive_int_value", Value::as_u64) {
        return Some((OptionValue::PositiveInt(n), "positive_int_value"));
    }
    if let Some(n) = scalar(opt, "negative_int_value", Value::as_i64) {
        return Some((OptionValue::NegativeInt(n), "negative_int_value"));
    }
    if let Some(d) = scalar(opt, "double_value", Value::as_f64) {
        return Some((OptionValue::Double(d), "double_value"));
    }
    if let Some(s) = scalar(opt, "string_value", |v| v.as_bytes().map(|b| b.to_vec())) {
        return Some((OptionValue::String(s), "string_value"));
    }
    string(opt, "aggregate_value").map(|a| (OptionValue::Aggregate(a), "aggregate_value"))
}

fn scalar<T>(msg: &DynamicMessage, name: &str, read: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
    if !msg.has_field_by_name(name) {
        return None;
    }
    msg.get_field_by_name(name).as_deref().and_then(read)
}

fn string(msg: &DynamicMessage, name: &str) -> Option<String> {
    scalar(msg, name, |v| v.as_str().map(str::to_owned))
}

fn int32(msg: &DynamicMessage, name: &str) -> Option<i32> {
    scalar(msg, name, Value::as_i32)
}

fn boolean(msg: &DynamicMessage, name: &str) -> Option<bool> {
    scalar(msg, name, Value::as_bool)
}

fn enum_number(msg: &DynamicMessage, name: &str) -> Option<i32> {
    scalar(msg, name, Value::as_enum_number)
}

fn list<T>(msg: &DynamicMessage, name: &str, read: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    match msg.get_field_by_name(name).as_deref() {
        Some(Value::List(items)) => items.iter().filter_map(read).collect(),
        _ => Vec::new(),
    }
}

fn messages<T>(msg: &DynamicMessage, name: &str, convert: impl Fn(&DynamicMessage) -> T) -> Vec<T> {
    list(msg, name, |v| v.as_message().map(&convert))
}

fn message<T>(
    msg: &DynamicMessage,
    name: &str,
    convert: impl FnOnce(&DynamicMessage) -> T,
) -> Option<T> {
    scalar(msg, name, |v| v.as_message().map(convert))
}

/// Encoding of every field of `msg` not listed in `mapped`
fn unknown(msg: &DynamicMessage, mapped: &[&str]) -> UnknownFields {
    let mut rest = msg.clone();
    for name in mapped {
        rest.clear_field_by_name(name);
    }
    UnknownFields::new(rest.encode_to_vec())
}

// =============================================================================
// Export
// =============================================================================

/// Convert a canonical file into a dynamic message of type `desc`
///
/// `desc` is normally [`file_descriptor_type`].
pub fn export_file(desc: &MessageDescriptor, file: &FileDescriptor) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set(&mut msg, "name", file.name.clone(), Value::String);
    set(&mut msg, "package", file.package.clone(), Value::String);
    set_list(&mut msg, "dependency", &file.dependency, |s| Value::String(s.clone()));
    set_list(&mut msg, "public_dependency", &file.public_dependency, |n| Value::I32(*n));
    set_list(&mut msg, "weak_dependency", &file.weak_dependency, |n| Value::I32(*n));
    set_messages(&mut msg, "message_type", &file.message_type, export_message);
    set_messages(&mut msg, "enum_type", &file.enum_type, export_enum);
    set_messages(&mut msg, "service", &file.service, export_service);
    set_messages(&mut msg, "extension", &file.extension, export_field);
    set_message(&mut msg, "options", file.options.as_ref(), export_file_options);
    set_message(
        &mut msg,
        "source_code_info",
        file.source_code_info.as_ref(),
        export_source_code_info,
    );
    set(&mut msg, "syntax", file.syntax.clone(), Value::String);
    restore(&mut msg, &file.unknown_fields);
    msg
}

fn export_message(desc: &MessageDescriptor, m: &MessageType) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set(&mut msg, "name", m.name.clone(), Value::String);
    set_messages(&mut msg, "field", &m.field, export_field);
    set_messages(&mut msg, "extension", &m.extension, export_field);
    set_messages(&mut msg, "nested_type", &m.nested_type, export_message);
    set_messages(&mut msg, "enum_type", &m.enum_type, export_enum);
    set_messages(&mut msg, "extension_range", &m.extension_range, |desc, range| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "start", range.start, Value::I32);
        set(&mut out, "end", range.end, Value::I32);
        set_message(&mut out, "options", range.options.as_ref(), |desc, opts| {
            let mut out = DynamicMessage::new(desc.clone());
            set_uninterpreted(&mut out, &opts.uninterpreted_option);
            restore(&mut out, &opts.unknown_fields);
            out
        });
        restore(&mut out, &range.unknown_fields);
        out
    });
    set_messages(&mut msg, "oneof_decl", &m.oneof_decl, |desc, oneof| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "name", oneof.name.clone(), Value::String);
        set_message(&mut out, "options", oneof.options.as_ref(), |desc, opts| {
            let mut out = DynamicMessage::new(desc.clone());
            set_uninterpreted(&mut out, &opts.uninterpreted_option);
            restore(&mut out, &opts.unknown_fields);
            out
        });
        restore(&mut out, &oneof.unknown_fields);
        out
    });
    set_message(&mut msg, "options", m.options.as_ref(), |desc, opts| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "message_set_wire_format", opts.message_set_wire_format, Value::Bool);
        set(
            &mut out,
            "no_standard_descriptor_accessor",
            opts.no_standard_descriptor_accessor,
            Value::Bool,
        );
        set(&mut out, "deprecated", opts.deprecated, Value::Bool);
        set(&mut out, "map_entry", opts.map_entry, Value::Bool);
        set_uninterpreted(&mut out, &opts.uninterpreted_option);
        restore(&mut out, &opts.unknown_fields);
        out
    });
    set_messages(&mut msg, "reserved_range", &m.reserved_range, |desc, range| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "start", range.start, Value::I32);
        set(&mut out, "end", range.end, Value::I32);
        restore(&mut out, &range.unknown_fields);
        out
    });
    set_list(&mut msg, "reserved_name", &m.reserved_name, |s| Value::String(s.clone()));
    restore(&mut msg, &m.unknown_fields);
    msg
}

fn export_field(desc: &MessageDescriptor, field: &Field) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set(&mut msg, "name", field.name.clone(), Value::String);
    set(&mut msg, "number", field.number, Value::I32);
    set(&mut msg, "label", field.label.map(Label::number), Value::EnumNumber);
    set(&mut msg, "type", field.r#type.map(FieldType::number), Value::EnumNumber);
    set(&mut msg, "type_name", field.type_name.clone(), Value::String);
    set(&mut msg, "extendee", field.extendee.clone(), Value::String);
    set(&mut msg, "default_value", field.default_value.clone(), Value::String);
    set(&mut msg, "oneof_index", field.oneof_index, Value::I32);
    set(&mut msg, "json_name", field.json_name.clone(), Value::String);
    set_message(&mut msg, "options", field.options.as_ref(), |desc, opts| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "ctype", opts.ctype.map(CType::number), Value::EnumNumber);
        set(&mut out, "packed", opts.packed, Value::Bool);
        set(&mut out, "jstype", opts.jstype.map(JsType::number), Value::EnumNumber);
        set(&mut out, "lazy", opts.lazy, Value::Bool);
        set(&mut out, "deprecated", opts.deprecated, Value::Bool);
        set(&mut out, "weak", opts.weak, Value::Bool);
        set_uninterpreted(&mut out, &opts.uninterpreted_option);
        restore(&mut out, &opts.unknown_fields);
        out
    });
    set(&mut msg, "proto3_optional", field.proto3_optional, Value::Bool);
    restore(&mut msg, &field.unknown_fields);
    msg
}

fn export_enum(desc: &MessageDescriptor, e: &EnumType) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set(&mut msg, "name", e.name.clone(), Value::String);
    set_messages(&mut msg, "value", &e.value, |desc, value| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "name", value.name.clone(), Value::String);
        set(&mut out, "number", value.number, Value::I32);
        set_message(&mut out, "options", value.options.as_ref(), |desc, opts| {
            let mut out = DynamicMessage::new(desc.clone());
            set(&mut out, "deprecated", opts.deprecated, Value::Bool);
            set_uninterpreted(&mut out, &opts.uninterpreted_option);
            restore(&mut out, &opts.unknown_fields);
            out
        });
        restore(&mut out, &value.unknown_fields);
        out
    });
    set_message(&mut msg, "options", e.options.as_ref(), |desc, opts| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "allow_alias", opts.allow_alias, Value::Bool);
        set(&mut out, "deprecated", opts.deprecated, Value::Bool);
        set_uninterpreted(&mut out, &opts.uninterpreted_option);
        restore(&mut out, &opts.unknown_fields);
        out
    });
    set_messages(&mut msg, "reserved_range", &e.reserved_range, |desc, range| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "start", range.start, Value::I32);
        set(&mut out, "end", range.end, Value::I32);
        restore(&mut out, &range.unknown_fields);
        out
    });
    set_list(&mut msg, "reserved_name", &e.reserved_name, |s| Value::String(s.clone()));
    restore(&mut msg, &e.unknown_fields);
    msg
}

fn export_service(desc: &MessageDescriptor, service: &Service) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set(&mut msg, "name", service.name.clone(), Value::String);
    set_messages(&mut msg, "method", &service.method, |desc, method| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "name", method.name.clone(), Value::String);
        set(&mut out, "input_type", method.input_type.clone(), Value::String);
        set(&mut out, "output_type", method.output_type.clone(), Value::String);
        set_message(&mut out, "options", method.options.as_ref(), |desc, opts| {
            let mut out = DynamicMessage::new(desc.clone());
            set(&mut out, "deprecated", opts.deprecated, Value::Bool);
            set(
                &mut out,
                "idempotency_level",
                opts.idempotency_level.map(IdempotencyLevel::number),
                Value::EnumNumber,
            );
            set_uninterpreted(&mut out, &opts.uninterpreted_option);
            restore(&mut out, &opts.unknown_fields);
            out
        });
        set(&mut out, "client_streaming", method.client_streaming, Value::Bool);
        set(&mut out, "server_streaming", method.server_streaming, Value::Bool);
        restore(&mut out, &method.unknown_fields);
        out
    });
    set_message(&mut msg, "options", service.options.as_ref(), |desc, opts| {
        let mut out = DynamicMessage::new(desc.clone());
        set(&mut out, "deprecated", opts.deprecated, Value::Bool);
        set_uninterpreted(&mut out, &opts.uninterpreted_option);
        restore(&mut out, &opts.unknown_fields);
        out
    });
    restore(&mut msg, &service.unknown_fields);
    msg
}

fn export_file_options(desc: &MessageDescriptor, opts: &FileOptions) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set(&mut msg, "java_package", opts.java_package.clone(), Value::String);
    set(&mut msg, "java_outer_classname", opts.java_outer_classname.clone(), Value::String);
    set(&mut msg, "java_multiple_files", opts.java_multiple_files, Value::Bool);
    set(
        &mut msg,
        "java_generate_equals_and_hash",
        opts.java_generate_equals_and_hash,
        Value::Bool,
    );
    set(&mut msg, "java_string_check_utf8", opts.java_string_check_utf8, Value::Bool);
    set(
        &mut msg,
        "optimize_for",
        opts.optimize_for.map(OptimizeMode::number),
        Value::EnumNumber,
    );
    set(&mut msg, "go_package", opts.go_package.clone(), Value::String);
    set(&mut msg, "cc_generic_services", opts.cc_generic_services, Value::Bool);
    set(&mut msg, "java_generic_services", opts.java_generic_services, Value::Bool);
    set(&mut msg, "py_generic_services", opts.py_generic_services, Value::Bool);
    set(&mut msg, "deprecated", opts.deprecated, Value::Bool);
    set(&mut msg, "cc_enable_arenas", opts.cc_enable_arenas, Value::Bool);
    set(&mut msg, "objc_class_prefix", opts.objc_class_prefix.clone(), Value::String);
    set(&mut msg, "csharp_namespace", opts.csharp_namespace.clone(), Value::String);
    set(&mut msg, "swift_prefix", opts.swift_prefix.clone(), Value::String);
    set(&mut msg, "php_class_prefix", opts.php_class_prefix.clone(), Value::String);
    set(&mut msg, "php_namespace", opts.php_namespace.clone(), Value::String);
    set(
        &mut msg,
        "php_metadata_namespace",
        opts.php_metadata_namespace.clone(),
        Value::String,
    );
    set(&mut msg, "ruby_package", opts.ruby_package.clone(), Value::String);
    set_uninterpreted(&mut msg, &opts.uninterpreted_option);
    restore(&mut msg, &opts.unknown_fields);
    msg
}

fn export_source_code_info(desc: &MessageDescriptor, info: &SourceCodeInfo) -> DynamicMessage {
    let mut msg = DynamicMessage::new(desc.clone());
    set_messages(&mut msg, "location", &info.location, |desc, loc| {
        let mut out = DynamicMessage::new(desc.clone());
        set_list(&mut out, "path", &loc.path, |n| Value::I32(*n));
        set_list(&mut out, "span", &loc.span, |n| Value::I32(*n));
        set(&mut out, "leading_comments", loc.leading_comments.clone(), Value::String);
        set(&mut out, "trailing_comments", loc.trailing_comments.clone(), Value::String);
        set_list(
            &mut out,
            "leading_detached_comments",
            &loc.leading_detached_comments,
            |s| Value::String(s.clone()),
        );
        restore(&mut out, &loc.unknown_fields);
        out
    });
    restore(&mut msg, &info.unknown_fields);
    msg
}

fn set_uninterpreted(msg: &mut DynamicMessage, opts: &[UninterpretedOption]) {
    set_messages(msg, "uninterpreted_option", opts, |desc, opt| {
        let mut out = DynamicMessage::new(desc.clone());
        set_messages(&mut out, "name", &opt.name, |desc, part| {
            let mut out = DynamicMessage::new(desc.clone());
            out.set_field_by_name("name_part", Value::String(part.name_part.clone()));
            out.set_field_by_name("is_extension", Value::Bool(part.is_extension));
            restore(&mut out, &part.unknown_fields);
            out
        });
        match &opt.value {
            Some(OptionValue::Identifier(ident)) => {
                out.set_field_by_name("identifier_value", Value::String(ident.clone()))
            }
            Some(OptionValue::PositiveInt(n)) => {
                out.set_field_by_name("positive_int_value", Value::U64(*n))
            }
            Some(OptionValue::NegativeInt(n)) => {
                out.set_field_by_name("negative_int_value", Value::I64(*n))
            }
            Some(OptionValue::Double(d)) => out.set_field_by_name("double_value", Value::F64(*d)),
            Some(OptionValue::String(s)) => {
                out.set_field_by_name("string_value", Value::Bytes(Bytes::from(s.clone())))
            }
            Some(OptionValue::Aggregate(a)) => {
                out.set_field_by_name("aggregate_value", Value::String(a.clone()))
            }
            None => {}
        }
        restore(&mut out, &opt.unknown_fields);
        out
    });
}

fn set<T>(msg: &mut DynamicMessage, name: &str, value: Option<T>, wrap: impl FnOnce(T) -> Value) {
    if let Some(value) = value {
        msg.set_field_by_name(name, wrap(value));
    }
}

fn set_list<T>(msg: &mut DynamicMessage, name: &str, items: &[T], wrap: impl Fn(&T) -> Value) {
    if !items.is_empty() {
        msg.set_field_by_name(name, Value::List(items.iter().map(wrap).collect()));
    }
}

/// Message type of the field `name` of `msg`
fn child_type(msg: &DynamicMessage, name: &str) -> Option<MessageDescriptor> {
    msg.descriptor()
        .get_field_by_name(name)?
        .kind()
        .as_message()
        .cloned()
}

fn set_messages<T>(
    msg: &mut DynamicMessage,
    name: &str,
    items: &[T],
    export: impl Fn(&MessageDescriptor, &T) -> DynamicMessage,
) {
    if items.is_empty() {
        return;
    }
    let Some(desc) = child_type(msg, name) else {
        tracing::warn!(field = name, "descriptor has no message field, dropping values");
        return;
    };
    let values = items
        .iter()
        .map(|item| Value::Message(export(&desc, item)))
        .collect();
    msg.set_field_by_name(name, Value::List(values));
}

fn set_message<T>(
    msg: &mut DynamicMessage,
    name: &str,
    item: Option<&T>,
    export: impl FnOnce(&MessageDescriptor, &T) -> DynamicMessage,
) {
    let Some(item) = item else {
        return;
    };
    let Some(desc) = child_type(msg, name) else {
        tracing::warn!(field = name, "descriptor has no message field, dropping value");
        return;
    };
    msg.set_field_by_name(name, Value::Message(export(&desc, item)));
}

/// Merge a node's unknown bytes back into the rebuilt message
fn restore(msg: &mut DynamicMessage, unknown: &UnknownFields) {
    if unknown.is_empty() {
        return;
    }
    if let Err(e) = msg.merge(unknown.as_bytes()) {
        tracing::warn!(
            message = msg.descriptor().full_name(),
            error = %e,
            "could not restore unknown fields"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint_field(number: u32, value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        prost::encoding::encode_key(number, prost::encoding::WireType::Varint, &mut buf);
        prost::encoding::encode_varint(value, &mut buf);
        buf
    }

    #[test]
    fn test_unset_fields_stay_unset() {
        let desc = file_descriptor_type();
        let file = FileDescriptor {
            name: Some("a.proto".to_string()),
            ..Default::default()
        };

        let msg = export_file(&desc, &file);
        assert!(msg.has_field_by_name("name"));
        assert!(!msg.has_field_by_name("package"));
        assert!(!msg.has_field_by_name("options"));
        assert_eq!(import_file(&msg), file);
    }

    #[test]
    fn test_zero_values_stay_set() {
        let desc = file_descriptor_type();
        let file = FileDescriptor {
            name: Some(String::new()),
            options: Some(FileOptions {
                deprecated: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let back = import_file(&export_file(&desc, &file));
        assert_eq!(back.name, Some(String::new()));
        assert_eq!(back.options.unwrap().deprecated, Some(false));
    }

    #[test]
    fn test_unknown_field_bytes_are_captured() {
        let known = prost_types::FileDescriptorProto {
            name: Some("a.proto".to_string()),
            ..Default::default()
        };
        let mut bytes = known.encode_to_vec();
        let extra = varint_field(999, 42);
        bytes.extend_from_slice(&extra);

        let file = decode_file(&bytes).unwrap();
        assert_eq!(file.name.as_deref(), Some("a.proto"));
        assert_eq!(file.unknown_fields.as_bytes(), extra.as_slice());

        let encoded = encode_file(&file);
        assert_eq!(decode_file(&encoded).unwrap(), file);
    }

    #[test]
    fn test_extra_option_slots_survive_round_trip() {
        let opt = prost_types::UninterpretedOption {
            identifier_value: Some("first".to_string()),
            aggregate_value: Some("second".to_string()),
            ..Default::default()
        };
        let proto = prost_types::FileDescriptorProto {
            name: Some("a.proto".to_string()),
            options: Some(prost_types::FileOptions {
                uninterpreted_option: vec![opt.clone()],
                ..Default::default()
            }),
            ..Default::default()
        };

        let file = decode_file(&proto.encode_to_vec()).unwrap();
        let parsed = &file.options.as_ref().unwrap().uninterpreted_option[0];
        assert_eq!(parsed.value, Some(OptionValue::Identifier("first".to_string())));
        assert!(!parsed.unknown_fields.is_empty());

        let encoded = encode_file(&file);
        let back = prost_types::FileDescriptorProto::decode(encoded.as_slice()).unwrap();
        assert_eq!(back.options.unwrap().uninterpreted_option, vec![opt]);
    }
}
