//! Helper library available to every template
//!
//! Helpers see the model the way templates do: as JSON produced by the
//! [`crate::schema`] `Serialize` impls. Fields carry `type` and `label` as
//! proto enum names (`TYPE_STRING`, `LABEL_REPEATED`), type names keep their
//! leading dot.
//!
//! Registry-backed helpers fail the render when the run was not started in
//! single-package mode.

use crate::registry::Registry;
use crate::schema::{FieldType, Label};
use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, RenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToTitleCase, ToUpperCamelCase,
};
use serde_json::Value as Json;

/// Install every helper on `hbs`
pub fn register<'a>(hbs: &mut Handlebars<'a>, registry: Option<&'a Registry>) {
    hbs.register_helper("camelCase", Box::new(camel_case));
    hbs.register_helper("pascalCase", Box::new(pascal_case));
    hbs.register_helper("snakeCase", Box::new(snake_case));
    hbs.register_helper("kebabCase", Box::new(kebab_case));
    hbs.register_helper("shoutySnakeCase", Box::new(shouty_snake_case));
    hbs.register_helper("titleCase", Box::new(title_case));
    hbs.register_helper("upperFirst", Box::new(upper_first));
    hbs.register_helper("lowerFirst", Box::new(lower_first));
    hbs.register_helper("upper", Box::new(upper));
    hbs.register_helper("lower", Box::new(lower));

    hbs.register_helper("trimPrefix", Box::new(trim_prefix));
    hbs.register_helper("trimSuffix", Box::new(trim_suffix));
    hbs.register_helper("replace", Box::new(replace));
    hbs.register_helper("hasPrefix", Box::new(has_prefix));
    hbs.register_helper("hasSuffix", Box::new(has_suffix));
    hbs.register_helper("contains", Box::new(contains));
    hbs.register_helper("concat", Box::new(Concat));
    hbs.register_helper("join", Box::new(join));
    hbs.register_helper("split", Box::new(split));
    hbs.register_helper("add", Box::new(Add));
    hbs.register_helper("json", Box::new(json));
    hbs.register_helper("prettyJson", Box::new(pretty_json));

    hbs.register_helper("shortType", Box::new(short_type));
    hbs.register_helper("trimDot", Box::new(trim_dot));
    hbs.register_helper("protoType", Box::new(proto_type));
    hbs.register_helper("rustType", Box::new(rust_type));
    hbs.register_helper("rustIdent", Box::new(rust_ident));
    hbs.register_helper("isRepeated", Box::new(is_repeated));
    hbs.register_helper("isMessage", Box::new(is_message));
    hbs.register_helper("isEnum", Box::new(is_enum));
    hbs.register_helper("isScalar", Box::new(is_scalar));
    hbs.register_helper("isOptional", Box::new(is_optional));
    hbs.register_helper("isStreaming", Box::new(is_streaming));
    hbs.register_helper("isClientStreaming", Box::new(is_client_streaming));
    hbs.register_helper("isServerStreaming", Box::new(is_server_streaming));
    hbs.register_helper("isBidiStreaming", Box::new(is_bidi_streaming));
    hbs.register_helper("leadingComments", Box::new(leading_comments));

    for lookup in [Lookup::Message, Lookup::Enum, Lookup::Service, Lookup::IsMap] {
        hbs.register_helper(lookup.name(), Box::new(RegistryHelper { registry, lookup }));
    }
}

// Naming

handlebars_helper!(camel_case: |s: str| s.to_lower_camel_case());
handlebars_helper!(pascal_case: |s: str| s.to_upper_camel_case());
handlebars_helper!(snake_case: |s: str| s.to_snake_case());
handlebars_helper!(kebab_case: |s: str| s.to_kebab_case());
handlebars_helper!(shouty_snake_case: |s: str| s.to_shouty_snake_case());
handlebars_helper!(title_case: |s: str| s.to_title_case());
handlebars_helper!(upper_first: |s: str| map_first(s, char::to_uppercase));
handlebars_helper!(lower_first: |s: str| map_first(s, char::to_lowercase));
handlebars_helper!(upper: |s: str| s.to_uppercase());
handlebars_helper!(lower: |s: str| s.to_lowercase());

fn map_first<I: Iterator<Item = char>>(s: &str, f: impl Fn(char) -> I) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first).chain(chars).collect(),
        None => String::new(),
    }
}

// Strings

handlebars_helper!(trim_prefix: |s: str, prefix: str| s.strip_prefix(prefix).unwrap_or(s).to_string());
handlebars_helper!(trim_suffix: |s: str, suffix: str| s.strip_suffix(suffix).unwrap_or(s).to_string());
handlebars_helper!(replace: |s: str, from: str, to: str| s.replace(from, to));
handlebars_helper!(has_prefix: |s: str, prefix: str| s.starts_with(prefix));
handlebars_helper!(has_suffix: |s: str, suffix: str| s.ends_with(suffix));
handlebars_helper!(contains: |s: str, needle: str| s.contains(needle));
handlebars_helper!(join: |items: array, sep: str| {
    items.iter().map(display).collect::<Vec<_>>().join(sep)
});
handlebars_helper!(split: |s: str, sep: str| {
    s.split(sep).map(|part| Json::String(part.to_string())).collect::<Vec<_>>()
});
handlebars_helper!(json: |v: Json| serde_json::to_string(v).unwrap_or_default());
handlebars_helper!(pretty_json: |v: Json| serde_json::to_string_pretty(v).unwrap_or_default());

/// Text of a JSON value as it would be rendered
fn display(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `{{concat a b ...}}`: every parameter rendered and joined
struct Concat;

impl HelperDef for Concat {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let joined: String = h.params().iter().map(|p| display(p.value())).collect();
        Ok(ScopedJson::Derived(Json::String(joined)))
    }
}

/// `{{add a b}}`: integer sum, failing the render on overflow
struct Add;

impl HelperDef for Add {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let operand = |index: usize| -> Result<i64, RenderError> {
            let value = h
                .param(index)
                .ok_or(RenderErrorReason::ParamNotFoundForIndex("add", index))?
                .value();
            value.as_i64().ok_or_else(|| {
                RenderErrorReason::Other(format!("add: {} is not an integer", value)).into()
            })
        };
        let (a, b) = (operand(0)?, operand(1)?);
        let sum = a
            .checked_add(b)
            .ok_or_else(|| RenderErrorReason::Other(format!("add: {} + {} overflows", a, b)))?;
        Ok(ScopedJson::Derived(Json::from(sum)))
    }
}

// Schema

handlebars_helper!(short_type: |s: str| s.rsplit('.').next().unwrap_or(s).to_string());
handlebars_helper!(trim_dot: |s: str| s.trim_start_matches('.').to_string());
handlebars_helper!(proto_type: |field: Json| proto_type_name(field));
handlebars_helper!(rust_type: |field: Json| rust_type_name(field));
handlebars_helper!(rust_ident: |s: str| escape_rust_ident(s));
handlebars_helper!(is_repeated: |field: Json| label_of(field) == Some(Label::Repeated));
handlebars_helper!(is_message: |field: Json| type_of(field) == Some(FieldType::Message));
handlebars_helper!(is_enum: |field: Json| type_of(field) == Some(FieldType::Enum));
handlebars_helper!(is_scalar: |field: Json| {
    type_of(field).and_then(FieldType::scalar_name).is_some()
});
handlebars_helper!(is_optional: |field: Json| field["proto3_optional"] == Json::Bool(true));
handlebars_helper!(is_streaming: |method: Json| {
    flag(method, "client_streaming") || flag(method, "server_streaming")
});
handlebars_helper!(is_client_streaming: |method: Json| {
    flag(method, "client_streaming") && !flag(method, "server_streaming")
});
handlebars_helper!(is_server_streaming: |method: Json| {
    flag(method, "server_streaming") && !flag(method, "client_streaming")
});
handlebars_helper!(is_bidi_streaming: |method: Json| {
    flag(method, "client_streaming") && flag(method, "server_streaming")
});
handlebars_helper!(leading_comments: |file: Json, path: str| comments_at(file, path));

fn type_of(field: &Json) -> Option<FieldType> {
    match &field["type"] {
        Json::String(name) => FieldType::from_str_name(name),
        Json::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(FieldType::from_number),
        _ => None,
    }
}

fn label_of(field: &Json) -> Option<Label> {
    field["label"].as_str().and_then(Label::from_str_name)
}

fn flag(node: &Json, key: &str) -> bool {
    node[key].as_bool().unwrap_or(false)
}

/// Scalar keyword, or the referenced type name without its leading dot
fn proto_type_name(field: &Json) -> String {
    match type_of(field).and_then(FieldType::scalar_name) {
        Some(scalar) => scalar.to_string(),
        None => field["type_name"]
            .as_str()
            .unwrap_or_default()
            .trim_start_matches('.')
            .to_string(),
    }
}

/// Rust type a prost-style binding would use for `field`
fn rust_type_name(field: &Json) -> String {
    let field_type = type_of(field);
    let base = match field_type {
        Some(FieldType::Double) => "f64".to_string(),
        Some(FieldType::Float) => "f32".to_string(),
        Some(FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64) => "i64".to_string(),
        Some(FieldType::Uint64 | FieldType::Fixed64) => "u64".to_string(),
        Some(FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32) => "i32".to_string(),
        Some(FieldType::Uint32 | FieldType::Fixed32) => "u32".to_string(),
        Some(FieldType::Bool) => "bool".to_string(),
        Some(FieldType::String) => "String".to_string(),
        Some(FieldType::Bytes) => "Vec<u8>".to_string(),
        Some(FieldType::Enum) => "i32".to_string(),
        _ => field["type_name"]
            .as_str()
            .and_then(|name| name.rsplit('.').next())
            .unwrap_or_default()
            .to_upper_camel_case(),
    };

    if label_of(field) == Some(Label::Repeated) {
        format!("Vec<{}>", base)
    } else if field_type == Some(FieldType::Message) || field["proto3_optional"] == Json::Bool(true)
    {
        format!("Option<{}>", base)
    } else {
        base
    }
}

/// `name` as a usable Rust identifier
///
/// Keywords become raw identifiers. Keywords that cannot be raw get a
/// trailing underscore, and characters outside identifiers become `_`.
pub fn escape_rust_ident(name: &str) -> String {
    if syn::parse_str::<syn::Ident>(name).is_ok() {
        return name.to_string();
    }

    let mut cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        cleaned.insert(0, '_');
    }
    if syn::parse_str::<syn::Ident>(&cleaned).is_ok() {
        return cleaned;
    }

    match cleaned.as_str() {
        "self" | "super" | "crate" | "Self" | "_" => format!("{}_", cleaned),
        _ => quote::format_ident!("r#{}", cleaned).to_string(),
    }
}

/// Leading comment of the location whose path is the dotted `path`
fn comments_at(file: &Json, path: &str) -> String {
    let wanted: Vec<i64> = path
        .split('.')
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect();

    file["source_code_info"]["location"]
        .as_array()
        .and_then(|locations| {
            locations.iter().find(|loc| {
                loc["path"]
                    .as_array()
                    .map(|p| p.iter().filter_map(Json::as_i64).eq(wanted.iter().copied()))
                    .unwrap_or(false)
            })
        })
        .and_then(|loc| loc["leading_comments"].as_str())
        .map(|comment| comment.trim().to_string())
        .unwrap_or_default()
}

// Registry

#[derive(Clone, Copy, Debug)]
enum Lookup {
    Message,
    Enum,
    Service,
    IsMap,
}

impl Lookup {
    fn name(self) -> &'static str {
        match self {
            Lookup::Message => "lookupMessage",
            Lookup::Enum => "lookupEnum",
            Lookup::Service => "lookupService",
            Lookup::IsMap => "isMap",
        }
    }
}

struct RegistryHelper<'a> {
    registry: Option<&'a Registry>,
    lookup: Lookup,
}

impl HelperDef for RegistryHelper<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let name = self.lookup.name();
        let registry = self.registry.ok_or_else(|| {
            RenderErrorReason::Other(format!("{} requires single-package-mode=true", name))
        })?;
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex(name, 0))?
            .value();

        let found = match self.lookup {
            Lookup::Message => to_json(registry.lookup_message(&type_name(param))),
            Lookup::Enum => to_json(registry.lookup_enum(&type_name(param))),
            Lookup::Service => to_json(registry.lookup_service(&type_name(param))),
            Lookup::IsMap => Json::Bool(is_map_field(registry, param)),
        };
        Ok(ScopedJson::Derived(found))
    }
}

/// A plain name, or the `type_name` of a field object
fn type_name(param: &Json) -> String {
    match param {
        Json::String(name) => name.clone(),
        other => other["type_name"].as_str().unwrap_or_default().to_string(),
    }
}

fn to_json<T: serde::Serialize>(node: Option<&T>) -> Json {
    node.and_then(|n| serde_json::to_value(n).ok())
        .unwrap_or(Json::Null)
}

fn is_map_field(registry: &Registry, field: &Json) -> bool {
    let entry = type_name(field);
    label_of(field) == Some(Label::Repeated)
        && type_of(field) == Some(FieldType::Message)
        && registry
            .pool()
            .get_message_by_name(entry.trim_start_matches('.'))
            .map(|m| m.is_map_entry())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FileDescriptor, MessageOptions, MessageType};
    use serde_json::json;

    fn engine(registry: Option<&Registry>) -> Handlebars<'_> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        register(&mut hbs, registry);
        hbs
    }

    fn render(template: &str, data: &Json) -> String {
        engine(None).render_template(template, data).unwrap()
    }

    #[test]
    fn test_naming_helpers() {
        let data = json!({ "name": "user_account" });
        assert_eq!(render("{{camelCase name}}", &data), "userAccount");
        assert_eq!(render("{{pascalCase name}}", &data), "UserAccount");
        assert_eq!(render("{{kebabCase name}}", &data), "user-account");
        assert_eq!(render("{{shoutySnakeCase name}}", &data), "USER_ACCOUNT");
        assert_eq!(render("{{snakeCase \"UserAccount\"}}", &data), "user_account");
        assert_eq!(render("{{upperFirst \"abc\"}}", &data), "Abc");
        assert_eq!(render("{{lowerFirst \"ABC\"}}", &data), "aBC");
    }

    #[test]
    fn test_string_helpers() {
        let data = json!({ "items": ["a", "b", 3] });
        assert_eq!(render("{{trimPrefix \"GetUser\" \"Get\"}}", &data), "User");
        assert_eq!(render("{{trimSuffix \"a.proto\" \".proto\"}}", &data), "a");
        assert_eq!(render("{{replace \"a.b.c\" \".\" \"/\"}}", &data), "a/b/c");
        assert_eq!(render("{{join items \", \"}}", &data), "a, b, 3");
        assert_eq!(render("{{concat \"x\" 1 \"y\"}}", &data), "x1y");
        assert_eq!(render("{{add 2 3}}", &data), "5");
        assert_eq!(render("{{#each (split \"a/b\" \"/\")}}[{{this}}]{{/each}}", &data), "[a][b]");
        assert_eq!(render("{{#if (hasPrefix \"abc\" \"a\")}}yes{{/if}}", &data), "yes");
        assert_eq!(render("{{json items}}", &data), r#"["a","b",3]"#);
    }

    #[test]
    fn test_add_overflow_is_an_error() {
        let data = json!({ "max": i64::MAX, "text": "seven" });
        let hbs = engine(None);

        let err = hbs.render_template("{{add max 1}}", &data).unwrap_err();
        assert!(err.to_string().contains("overflows"), "{err}");
        assert!(hbs.render_template("{{add text 1}}", &data).is_err());
        let data = json!({ "max": i64::MAX, "minus": -1 });
        assert_eq!(render("{{add max minus}}", &data), (i64::MAX - 1).to_string());
    }

    #[test]
    fn test_out_of_range_type_number_is_unknown() {
        let field = json!({ "type": 4_294_967_305_i64 });
        assert_eq!(type_of(&field), None);
        assert_eq!(type_of(&json!({ "type": 9 })), Some(FieldType::String));
    }

    #[test]
    fn test_field_helpers() {
        let data = json!({
            "id": { "type": "TYPE_INT64", "label": "LABEL_OPTIONAL" },
            "tags": { "type": "TYPE_STRING", "label": "LABEL_REPEATED" },
            "owner": { "type": "TYPE_MESSAGE", "label": "LABEL_OPTIONAL", "type_name": ".acme.user_info" },
            "nick": { "type": "TYPE_STRING", "label": "LABEL_OPTIONAL", "proto3_optional": true },
        });
        assert_eq!(render("{{rustType id}}", &data), "i64");
        assert_eq!(render("{{rustType tags}}", &data), "Vec<String>");
        assert_eq!(render("{{rustType owner}}", &data), "Option<UserInfo>");
        assert_eq!(render("{{rustType nick}}", &data), "Option<String>");
        assert_eq!(render("{{protoType owner}}", &data), "acme.user_info");
        assert_eq!(render("{{protoType tags}}", &data), "string");
        assert_eq!(render("{{#if (isRepeated tags)}}r{{/if}}", &data), "r");
        assert_eq!(render("{{#if (isMessage owner)}}m{{/if}}", &data), "m");
        assert_eq!(render("{{#if (isScalar owner)}}s{{else}}n{{/if}}", &data), "n");
        assert_eq!(render("{{#if (isOptional nick)}}o{{/if}}", &data), "o");
        assert_eq!(render("{{shortType owner.type_name}}", &data), "user_info");
    }

    #[test]
    fn test_streaming_helpers() {
        let data = json!({ "m": { "client_streaming": true, "server_streaming": true } });
        assert_eq!(render("{{#if (isBidiStreaming m)}}b{{/if}}", &data), "b");
        assert_eq!(render("{{#if (isClientStreaming m)}}c{{else}}-{{/if}}", &data), "-");
        assert_eq!(render("{{#if (isStreaming m)}}s{{/if}}", &data), "s");
    }

    #[test]
    fn test_rust_ident() {
        assert_eq!(escape_rust_ident("name"), "name");
        assert_eq!(escape_rust_ident("type"), "r#type");
        assert_eq!(escape_rust_ident("self"), "self_");
        assert_eq!(escape_rust_ident("2fa"), "_2fa");
        assert_eq!(escape_rust_ident("my-field"), "my_field");
    }

    #[test]
    fn test_leading_comments() {
        let data = json!({
            "file": {
                "source_code_info": {
                    "location": [
                        { "path": [4, 0], "leading_comments": " A user.\n" },
                        { "path": [4, 0, 2, 1], "leading_comments": " Their name.\n" },
                    ]
                }
            }
        });
        assert_eq!(render("{{leadingComments file \"4.0\"}}", &data), "A user.");
        assert_eq!(render("{{leadingComments file \"4.0.2.1\"}}", &data), "Their name.");
        assert_eq!(render("{{leadingComments file \"4.1\"}}", &data), "");
    }

    #[test]
    fn test_registry_helpers_need_registry() {
        let err = engine(None)
            .render_template("{{lookupMessage \"a.B\"}}", &json!({}))
            .unwrap_err();
        assert!(err.to_string().contains("single-package-mode"));
    }

    #[test]
    fn test_registry_helpers() {
        let string_field = |name: &str, number: i32| Field {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional),
            r#type: Some(FieldType::String),
            json_name: Some(name.to_string()),
            ..Default::default()
        };
        let entry = MessageType {
            name: Some("LabelsEntry".to_string()),
            field: vec![string_field("key", 1), string_field("value", 2)],
            options: Some(MessageOptions {
                map_entry: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let file = FileDescriptor {
            name: Some("a.proto".to_string()),
            package: Some("acme".to_string()),
            message_type: vec![MessageType {
                name: Some("Item".to_string()),
                nested_type: vec![entry],
                field: vec![Field {
                    name: Some("labels".to_string()),
                    number: Some(1),
                    label: Some(Label::Repeated),
                    r#type: Some(FieldType::Message),
                    type_name: Some(".acme.Item.LabelsEntry".to_string()),
                    json_name: Some("labels".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };
        let registry = Registry::load(&[file]).unwrap();
        let hbs = engine(Some(&registry));

        let data = json!({
            "f": { "type": "TYPE_MESSAGE", "label": "LABEL_REPEATED", "type_name": ".acme.Item.LabelsEntry" }
        });
        let out = hbs
            .render_template("{{#if (isMap f)}}map{{/if}} {{#with (lookupMessage \".acme.Item\")}}{{name}}{{/with}}", &data)
            .unwrap();
        assert_eq!(out, "map Item");
    }
}
