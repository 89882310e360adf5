//! Data bound to every template expansion

use crate::schema::{EnumType, FileDescriptor, Service};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

/// Variable naming the root that `module_path` is computed against
pub const SOURCE_ROOT_VAR: &str = "PROTOC_GEN_TEMPLATE_SOURCE_ROOT";

/// Build metadata observed from the process environment
///
/// Captured once per run and shared by every render context.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Environment {
    /// When the run started
    pub build_date: DateTime<Utc>,
    /// Host name, empty when unknown
    pub build_hostname: String,
    /// Login name, empty when unknown
    pub build_user: String,
    /// Working directory of the plugin process
    pub pwd: String,
    /// Working directory relative to the source root, when inside it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
}

impl Environment {
    /// Read the current process environment
    pub fn capture() -> Self {
        let pwd = env::current_dir().unwrap_or_default();
        let module_path = env::var_os(SOURCE_ROOT_VAR)
            .filter(|root| !root.is_empty())
            .and_then(|root| module_path(&pwd, Path::new(&root)));

        Self {
            build_date: Utc::now(),
            build_hostname: gethostname::gethostname().to_string_lossy().into_owned(),
            build_user: env::var("USER")
                .or_else(|_| env::var("USERNAME"))
                .unwrap_or_default(),
            pwd: pwd.display().to_string(),
            module_path,
        }
    }
}

/// `pwd` relative to `source_root`, or `None` when it lies outside
pub fn module_path(pwd: &Path, source_root: &Path) -> Option<String> {
    let rel = pwd.strip_prefix(source_root).ok()?;
    Some(super::discover::template_name(rel))
}

/// Everything a single template sees
///
/// Built fresh for each template and owned by the task rendering it.
/// Serializes with snake_case keys, so templates read `{{file.package}}`,
/// `{{service.name}}`, `{{build_date}}` and so on.
#[derive(Clone, Debug, Serialize)]
pub struct RenderContext<'a> {
    #[serde(flatten)]
    env: &'a Environment,
    /// Verbose mode flag
    pub debug: bool,
    /// Prefix applied to output paths
    pub destination_dir: &'a str,
    /// File being rendered
    pub file: &'a FileDescriptor,
    /// Template path relative to the template root, before expansion
    pub raw_filename: String,
    /// Expanded output name, empty until the filename phase has run
    pub filename: String,
    /// Template root directory
    pub template_dir: PathBuf,
    /// Service being rendered, absent in whole-file mode
    pub service: Option<&'a Service>,
    /// Top-level enums of `file`
    #[serde(rename = "enum")]
    pub enums: &'a [EnumType],
}

impl<'a> RenderContext<'a> {
    /// Context for `raw_filename` with an empty `filename`
    pub fn new(
        env: &'a Environment,
        file: &'a FileDescriptor,
        service: Option<&'a Service>,
        raw_filename: String,
    ) -> Self {
        Self {
            env,
            debug: false,
            destination_dir: crate::params::DEFAULT_DESTINATION_DIR,
            file,
            raw_filename,
            filename: String::new(),
            template_dir: PathBuf::new(),
            service,
            enums: &file.enum_type,
        }
    }
}
