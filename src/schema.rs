//! Canonical in-memory model of a protobuf schema description
//!
//! This is the single representation the rest of the crate works with. The
//! [`bridge`](crate::bridge) module converts it to and from the descriptor
//! types of `prost-types` and `prost-reflect`.
//!
//! Every optional scalar is an `Option`, so an unset value and an explicitly
//! set zero value stay distinct. Every node carries the raw bytes of any
//! fields the model does not name in [`UnknownFields`].
//!
//! All types serialize with serde using the field names from
//! `descriptor.proto`, which is what templates see.

use serde::{Serialize, Serializer};

/// Raw protobuf bytes of fields a node carried that the model does not name
///
/// The bytes are never interpreted. They are skipped when a node is
/// serialized into a template context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct UnknownFields(Vec<u8>);

impl UnknownFields {
    /// Wrap already-encoded field bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        UnknownFields(bytes)
    }

    /// The encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of encoded bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the node carried no unknown fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for UnknownFields {
    fn from(bytes: Vec<u8>) -> Self {
        UnknownFields(bytes)
    }
}

/// Declares a closed protobuf enum that still keeps numbers it has no name for
macro_rules! proto_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $number:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A number with no name in `descriptor.proto`
            Unrecognized(i32),
        }

        impl $name {
            /// Map a wire number, keeping numbers without a name
            pub fn from_number(number: i32) -> Self {
                match number {
                    $($number => $name::$variant,)+
                    other => $name::Unrecognized(other),
                }
            }

            /// Wire number of this value
            pub fn number(self) -> i32 {
                match self {
                    $($name::$variant => $number,)+
                    $name::Unrecognized(number) => number,
                }
            }

            /// Name of this value in `descriptor.proto`
            pub fn as_str_name(self) -> Option<&'static str> {
                match self {
                    $($name::$variant => Some($text),)+
                    $name::Unrecognized(_) => None,
                }
            }

            /// Value named `text` in `descriptor.proto`
            pub fn from_str_name(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self.as_str_name() {
                    Some(name) => serializer.serialize_str(name),
                    None => serializer.serialize_i32(self.number()),
                }
            }
        }
    };
}

proto_enum! {
    /// Wire type of a field
    FieldType {
        /// `double`
        Double = 1 => "TYPE_DOUBLE",
        /// `float`
        Float = 2 => "TYPE_FLOAT",
        /// `int64`
        Int64 = 3 => "TYPE_INT64",
        /// `uint64`
        Uint64 = 4 => "TYPE_UINT64",
        /// `int32`
        Int32 = 5 => "TYPE_INT32",
        /// `fixed64`
        Fixed64 = 6 => "TYPE_FIXED64",
        /// `fixed32`
        Fixed32 = 7 => "TYPE_FIXED32",
        /// `bool`
        Bool = 8 => "TYPE_BOOL",
        /// `string`
        String = 9 => "TYPE_STRING",
        /// proto2 group
        Group = 10 => "TYPE_GROUP",
        /// Message reference
        Message = 11 => "TYPE_MESSAGE",
        /// `bytes`
        Bytes = 12 => "TYPE_BYTES",
        /// `uint32`
        Uint32 = 13 => "TYPE_UINT32",
        /// Enum reference
        Enum = 14 => "TYPE_ENUM",
        /// `sfixed32`
        Sfixed32 = 15 => "TYPE_SFIXED32",
        /// `sfixed64`
        Sfixed64 = 16 => "TYPE_SFIXED64",
        /// `sint32`
        Sint32 = 17 => "TYPE_SINT32",
        /// `sint64`
        Sint64 = 18 => "TYPE_SINT64",
    }
}

impl FieldType {
    /// Scalar keyword used in `.proto` source, `None` for messages, enums and groups
    pub fn scalar_name(self) -> Option<&'static str> {
        let name = match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int64 => "int64",
            FieldType::Uint64 => "uint64",
            FieldType::Int32 => "int32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Uint32 => "uint32",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
            FieldType::Group
            | FieldType::Message
            | FieldType::Enum
            | FieldType::Unrecognized(_) => return None,
        };
        Some(name)
    }
}

proto_enum! {
    /// Cardinality of a field
    Label {
        /// `optional`
        Optional = 1 => "LABEL_OPTIONAL",
        /// `required`
        Required = 2 => "LABEL_REQUIRED",
        /// `repeated`
        Repeated = 3 => "LABEL_REPEATED",
    }
}

proto_enum! {
    /// `optimize_for` file option
    OptimizeMode {
        /// Generate complete code
        Speed = 1 => "SPEED",
        /// Reflection-based code
        CodeSize = 2 => "CODE_SIZE",
        /// Lite runtime
        LiteRuntime = 3 => "LITE_RUNTIME",
    }
}

proto_enum! {
    /// `ctype` field option
    CType {
        /// Default string representation
        String = 0 => "STRING",
        /// Cord representation
        Cord = 1 => "CORD",
        /// String piece representation
        StringPiece = 2 => "STRING_PIECE",
    }
}

proto_enum! {
    /// `jstype` field option
    JsType {
        /// Use the default type
        JsNormal = 0 => "JS_NORMAL",
        /// JavaScript string
        JsString = 1 => "JS_STRING",
        /// JavaScript number
        JsNumber = 2 => "JS_NUMBER",
    }
}

proto_enum! {
    /// `idempotency_level` method option
    IdempotencyLevel {
        /// Unspecified
        IdempotencyUnknown = 0 => "IDEMPOTENCY_UNKNOWN",
        /// Implies idempotent
        NoSideEffects = 1 => "NO_SIDE_EFFECTS",
        /// Idempotent, but may have side effects
        Idempotent = 2 => "IDEMPOTENT",
    }
}

/// A `.proto` file
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FileDescriptor {
    /// File name relative to the import root
    pub name: Option<String>,
    /// Declared package
    pub package: Option<String>,
    /// Imported files
    pub dependency: Vec<String>,
    /// Indexes into `dependency` of public imports
    pub public_dependency: Vec<i32>,
    /// Indexes into `dependency` of weak imports
    pub weak_dependency: Vec<i32>,
    /// Top-level messages in declaration order
    pub message_type: Vec<MessageType>,
    /// Top-level enums
    pub enum_type: Vec<EnumType>,
    /// Services
    pub service: Vec<Service>,
    /// Top-level extensions
    pub extension: Vec<Field>,
    /// File options
    pub options: Option<FileOptions>,
    /// Source locations and comments
    pub source_code_info: Option<SourceCodeInfo>,
    /// `proto2` or `proto3`
    pub syntax: Option<String>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl FileDescriptor {
    /// File name, empty when unset
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Package, empty when unset
    pub fn package(&self) -> &str {
        self.package.as_deref().unwrap_or_default()
    }
}

/// A message declaration
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MessageType {
    /// Message name
    pub name: Option<String>,
    /// Fields
    pub field: Vec<Field>,
    /// Extensions declared inside this message
    pub extension: Vec<Field>,
    /// Nested messages
    pub nested_type: Vec<MessageType>,
    /// Nested enums
    pub enum_type: Vec<EnumType>,
    /// Extension ranges
    pub extension_range: Vec<ExtensionRange>,
    /// Oneof declarations
    pub oneof_decl: Vec<Oneof>,
    /// Message options
    pub options: Option<MessageOptions>,
    /// Reserved field number ranges
    pub reserved_range: Vec<ReservedRange>,
    /// Reserved field names
    pub reserved_name: Vec<String>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl MessageType {
    /// Message name, empty when unset
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// An extension range of a message
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExtensionRange {
    /// Inclusive start
    pub start: Option<i32>,
    /// Exclusive end
    pub end: Option<i32>,
    /// Range options
    pub options: Option<ExtensionRangeOptions>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// A reserved range of field numbers
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReservedRange {
    /// Inclusive start
    pub start: Option<i32>,
    /// Exclusive end
    pub end: Option<i32>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// A field or extension declaration
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Field {
    /// Field name
    pub name: Option<String>,
    /// Field number
    pub number: Option<i32>,
    /// Cardinality
    pub label: Option<Label>,
    /// Wire type
    #[serde(rename = "type")]
    pub r#type: Option<FieldType>,
    /// Referenced message or enum, fully qualified when resolved
    pub type_name: Option<String>,
    /// Extended message for extensions
    pub extendee: Option<String>,
    /// Default value in text form
    pub default_value: Option<String>,
    /// Index into the parent's `oneof_decl`
    pub oneof_index: Option<i32>,
    /// JSON name
    pub json_name: Option<String>,
    /// Field options
    pub options: Option<FieldOptions>,
    /// Set for proto3 `optional` fields
    pub proto3_optional: Option<bool>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl Field {
    /// Field name, empty when unset
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// True for `repeated` fields
    pub fn is_repeated(&self) -> bool {
        self.label == Some(Label::Repeated)
    }
}

/// A oneof declaration
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Oneof {
    /// Oneof name
    pub name: Option<String>,
    /// Oneof options
    pub options: Option<OneofOptions>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// An enum declaration
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EnumType {
    /// Enum name
    pub name: Option<String>,
    /// Values in declaration order
    pub value: Vec<EnumValue>,
    /// Enum options
    pub options: Option<EnumOptions>,
    /// Reserved value ranges
    pub reserved_range: Vec<EnumReservedRange>,
    /// Reserved value names
    pub reserved_name: Vec<String>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl EnumType {
    /// Enum name, empty when unset
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// A reserved range of enum numbers
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EnumReservedRange {
    /// Inclusive start
    pub start: Option<i32>,
    /// Inclusive end
    pub end: Option<i32>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// One value of an enum
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EnumValue {
    /// Value name
    pub name: Option<String>,
    /// Value number
    pub number: Option<i32>,
    /// Value options
    pub options: Option<EnumValueOptions>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// A service declaration
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Service {
    /// Service name
    pub name: Option<String>,
    /// Methods in declaration order
    pub method: Vec<Method>,
    /// Service options
    pub options: Option<ServiceOptions>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

impl Service {
    /// Service name, empty when unset
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// An RPC method
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Method {
    /// Method name
    pub name: Option<String>,
    /// Fully qualified request message
    pub input_type: Option<String>,
    /// Fully qualified response message
    pub output_type: Option<String>,
    /// Method options
    pub options: Option<MethodOptions>,
    /// Client streams requests
    pub client_streaming: Option<bool>,
    /// Server streams responses
    pub server_streaming: Option<bool>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of a file
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FileOptions {
    /// `java_package`
    pub java_package: Option<String>,
    /// `java_outer_classname`
    pub java_outer_classname: Option<String>,
    /// `java_multiple_files`
    pub java_multiple_files: Option<bool>,
    /// `java_generate_equals_and_hash`
    pub java_generate_equals_and_hash: Option<bool>,
    /// `java_string_check_utf8`
    pub java_string_check_utf8: Option<bool>,
    /// `optimize_for`
    pub optimize_for: Option<OptimizeMode>,
    /// `go_package`
    pub go_package: Option<String>,
    /// `cc_generic_services`
    pub cc_generic_services: Option<bool>,
    /// `java_generic_services`
    pub java_generic_services: Option<bool>,
    /// `py_generic_services`
    pub py_generic_services: Option<bool>,
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// `cc_enable_arenas`
    pub cc_enable_arenas: Option<bool>,
    /// `objc_class_prefix`
    pub objc_class_prefix: Option<String>,
    /// `csharp_namespace`
    pub csharp_namespace: Option<String>,
    /// `swift_prefix`
    pub swift_prefix: Option<String>,
    /// `php_class_prefix`
    pub php_class_prefix: Option<String>,
    /// `php_namespace`
    pub php_namespace: Option<String>,
    /// `php_metadata_namespace`
    pub php_metadata_namespace: Option<String>,
    /// `ruby_package`
    pub ruby_package: Option<String>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of a message
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MessageOptions {
    /// `message_set_wire_format`
    pub message_set_wire_format: Option<bool>,
    /// `no_standard_descriptor_accessor`
    pub no_standard_descriptor_accessor: Option<bool>,
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// Set on synthesized map entry messages
    pub map_entry: Option<bool>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of a field
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldOptions {
    /// `ctype`
    pub ctype: Option<CType>,
    /// `packed`
    pub packed: Option<bool>,
    /// `jstype`
    pub jstype: Option<JsType>,
    /// `lazy`
    pub lazy: Option<bool>,
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// `weak`
    pub weak: Option<bool>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of a oneof
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OneofOptions {
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of an enum
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EnumOptions {
    /// `allow_alias`
    pub allow_alias: Option<bool>,
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of an enum value
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EnumValueOptions {
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of a service
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ServiceOptions {
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of a method
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MethodOptions {
    /// `deprecated`
    pub deprecated: Option<bool>,
    /// `idempotency_level`
    pub idempotency_level: Option<IdempotencyLevel>,
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Options of an extension range
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ExtensionRangeOptions {
    /// Options the compiler could not resolve
    pub uninterpreted_option: Vec<UninterpretedOption>,
    /// Fields not named by the model, including custom extensions
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// An option the compiler parsed but could not resolve
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UninterpretedOption {
    /// Dotted name, one part per segment
    pub name: Vec<NamePart>,
    /// The single value slot that was populated, if any
    pub value: Option<OptionValue>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// One segment of an uninterpreted option name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NamePart {
    /// Segment text
    pub name_part: String,
    /// True when the segment was written in parentheses
    pub is_extension: bool,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// Value of an uninterpreted option; exactly one slot is ever populated
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    /// Bare identifier such as `true` or an enum value name
    Identifier(String),
    /// Non-negative integer literal
    PositiveInt(u64),
    /// Negative integer literal
    NegativeInt(i64),
    /// Floating point literal
    Double(f64),
    /// String literal, as raw bytes
    #[serde(serialize_with = "serialize_lossy_utf8")]
    String(Vec<u8>),
    /// Text-format aggregate between braces
    Aggregate(String),
}

#[allow(clippy::ptr_arg)]
fn serialize_lossy_utf8<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// Source locations of a file
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SourceCodeInfo {
    /// Locations
    pub location: Vec<Location>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

/// One source location
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Location {
    /// Path of field numbers and indexes from the file root
    pub path: Vec<i32>,
    /// Line and column span
    pub span: Vec<i32>,
    /// Comment block before the element
    pub leading_comments: Option<String>,
    /// Comment after the element
    pub trailing_comments: Option<String>,
    /// Detached comment blocks before the element
    pub leading_detached_comments: Vec<String>,
    /// Fields not named by the model
    #[serde(skip)]
    pub unknown_fields: UnknownFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_keeps_unrecognized_number() {
        assert_eq!(FieldType::from_number(9), FieldType::String);
        assert_eq!(FieldType::from_number(99), FieldType::Unrecognized(99));
        assert_eq!(FieldType::Unrecognized(99).number(), 99);
        assert_eq!(Label::from_number(3).as_str_name(), Some("LABEL_REPEATED"));
    }

    #[test]
    fn test_field_serializes_with_proto_names() {
        let field = Field {
            name: Some("id".to_string()),
            number: Some(1),
            r#type: Some(FieldType::Int64),
            label: Some(Label::Optional),
            unknown_fields: UnknownFields::new(vec![0xa0, 0x06, 0x01]),
            ..Default::default()
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "TYPE_INT64");
        assert_eq!(json["label"], "LABEL_OPTIONAL");
        assert_eq!(json["json_name"], serde_json::Value::Null);
        assert!(json.get("unknown_fields").is_none());
    }

    #[test]
    fn test_option_value_is_tagged() {
        let json = serde_json::to_value(OptionValue::String(b"users".to_vec())).unwrap();
        assert_eq!(json["kind"], "string");
        assert_eq!(json["value"], "users");

        let json = serde_json::to_value(OptionValue::PositiveInt(7)).unwrap();
        assert_eq!(json["kind"], "positive_int");
        assert_eq!(json["value"], 7);
    }

    #[test]
    fn test_scalar_name() {
        assert_eq!(FieldType::Sint64.scalar_name(), Some("sint64"));
        assert_eq!(FieldType::Message.scalar_name(), None);
    }
}
