//! Plugin parameter parsing
//!
//! protoc forwards everything after `--template_opt=` (or the part of
//! `--template_out` before the colon) as a single comma-separated string of
//! `key=value` pairs. Bad input never aborts generation: malformed pairs,
//! unknown keys and unparsable booleans are logged and skipped.

use std::path::PathBuf;

/// Default root searched for templates
pub const DEFAULT_TEMPLATE_DIR: &str = "./templates";

/// Default prefix for output paths, meaning no prefix
pub const DEFAULT_DESTINATION_DIR: &str = ".";

/// Settings controlling a generation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Params {
    /// Root directory walked for `.tmpl` files
    pub template_dir: PathBuf,
    /// Prefix applied to every output path
    pub destination_dir: String,
    /// Load every request file into a shared registry before rendering
    pub single_package_mode: bool,
    /// Verbose logging, also exposed to templates
    pub debug: bool,
    /// Render once per file instead of once per service
    pub all: bool,
    /// Pretty-print generated `.rs` outputs
    pub rustfmt: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            destination_dir: DEFAULT_DESTINATION_DIR.to_string(),
            single_package_mode: false,
            debug: false,
            all: false,
            rustfmt: false,
        }
    }
}

impl Params {
    /// Parse the request's parameter string
    pub fn parse(parameter: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(parameter) = parameter else {
            return params;
        };

        for pair in parameter.split(',') {
            if pair.is_empty() {
                continue;
            }
            let parts: Vec<&str> = pair.split('=').collect();
            let [key, value] = parts.as_slice() else {
                tracing::warn!(parameter = pair, "invalid parameter");
                continue;
            };

            match *key {
                "template_dir" => params.template_dir = PathBuf::from(value),
                "destination_dir" => params.destination_dir = value.to_string(),
                "single-package-mode" => set_flag(&mut params.single_package_mode, key, value),
                "debug" => set_flag(&mut params.debug, key, value),
                "all" => set_flag(&mut params.all, key, value),
                "rustfmt" => set_flag(&mut params.rustfmt, key, value),
                _ => tracing::warn!(parameter = pair, "unknown parameter"),
            }
        }

        params
    }
}

fn set_flag(flag: &mut bool, key: &str, value: &str) {
    match parse_bool(value) {
        Some(parsed) => *flag = parsed,
        None => tracing::warn!(key, value, "invalid boolean value"),
    }
}

/// `true`/`t`/`false`/`f`, case-insensitive
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" => Some(true),
        "false" | "f" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults_without_parameter() {
        let params = Params::parse(None);
        assert_eq!(params, Params::default());
        assert_eq!(params.template_dir, PathBuf::from("./templates"));
        assert_eq!(params.destination_dir, ".");
    }

    #[test]
    fn test_all_keys() {
        let params = Params::parse(Some(
            "template_dir=tpl,destination_dir=out,single-package-mode=true,debug=t,all=TRUE,rustfmt=true",
        ));
        assert_eq!(params.template_dir, PathBuf::from("tpl"));
        assert_eq!(params.destination_dir, "out");
        assert!(params.single_package_mode);
        assert!(params.debug);
        assert!(params.all);
        assert!(params.rustfmt);
    }

    #[test_case("true", Some(true))]
    #[test_case("T", Some(true))]
    #[test_case("False", Some(false))]
    #[test_case("f", Some(false))]
    #[test_case("yes", None)]
    #[test_case("", None)]
    fn test_parse_bool(value: &str, expected: Option<bool>) {
        assert_eq!(parse_bool(value), expected);
    }

    #[test_case("all"; "missing value")]
    #[test_case("all=true=false"; "too many parts")]
    #[test_case("colour=blue"; "unknown key")]
    #[test_case("all=maybe"; "invalid boolean")]
    #[test_case(",,"; "empty segments")]
    fn test_bad_input_keeps_defaults(parameter: &str) {
        assert_eq!(Params::parse(Some(parameter)), Params::default());
    }

    #[test]
    fn test_bad_pair_does_not_stop_parsing() {
        let params = Params::parse(Some("bogus,all=true"));
        assert!(params.all);
    }

    #[test]
    fn test_later_value_wins() {
        let params = Params::parse(Some("all=true,all=false"));
        assert!(!params.all);
    }
}
