//! Two-phase template expansion
//!
//! Each template is expanded twice against the same context and helpers:
//! first its relative path, giving the output name, then its body.

use super::context::{Environment, RenderContext};
use super::discover::{self, template_name};
use super::engine::Target;
use super::{helpers, TEMPLATE_SUFFIX};
use crate::params::Params;
use crate::registry::Registry;
use crate::GeneratorError;
use handlebars::Handlebars;
use std::fs;
use std::path::{Path, PathBuf};

/// One rendered output file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    /// Output path, destination prefix included
    pub name: String,
    /// Expanded body
    pub content: String,
}

/// Shared rendering state for a run
///
/// Holds the Handlebars registry (helpers and partials) and the discovered
/// template set. Read-only once built, so rendering tasks share it freely.
pub struct Renderer<'a> {
    hbs: Handlebars<'a>,
    params: &'a Params,
    templates: Vec<PathBuf>,
}

impl<'a> Renderer<'a> {
    /// Prepare helpers and partials and discover the template set
    pub fn new(params: &'a Params, registry: Option<&'a Registry>) -> Result<Self, GeneratorError> {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut hbs, registry);

        let root = &params.template_dir;
        let templates = discover::discover(root)?;
        for (name, path) in discover::partials(root)? {
            let source = fs::read_to_string(&path)?;
            hbs.register_partial(&name, source)
                .map_err(|e| GeneratorError::Render {
                    template: name.clone(),
                    message: e.to_string(),
                })?;
            tracing::debug!(partial = %name, "registered partial");
        }

        Ok(Self {
            hbs,
            params,
            templates,
        })
    }

    /// Templates found under the template root, relative and sorted
    pub fn templates(&self) -> &[PathBuf] {
        &self.templates
    }

    /// Expand the template at `rel` for `target`
    pub fn render(
        &self,
        target: &Target<'_>,
        env: &Environment,
        rel: &Path,
    ) -> Result<Rendered, GeneratorError> {
        let raw_filename = template_name(rel);
        let failed = |phase: &str, message: String| GeneratorError::Render {
            template: raw_filename.clone(),
            message: format!("{}: {}", phase, message),
        };

        let mut ctx = RenderContext::new(env, target.file(), target.service(), raw_filename.clone());
        ctx.debug = self.params.debug;
        ctx.destination_dir = &self.params.destination_dir;
        ctx.template_dir = self.params.template_dir.clone();

        let filename = self
            .hbs
            .render_template(&raw_filename, &ctx)
            .map_err(|e| failed("filename", e.to_string()))?;
        ctx.filename = filename;

        let source = fs::read_to_string(self.params.template_dir.join(rel))
            .map_err(|e| failed("read", e.to_string()))?;
        let content = self
            .hbs
            .render_template(&source, &ctx)
            .map_err(|e| failed("body", e.to_string()))?;

        let stripped = ctx
            .filename
            .strip_suffix(TEMPLATE_SUFFIX)
            .unwrap_or(ctx.filename.as_str());
        let name = output_path(&self.params.destination_dir, stripped);
        let content = if self.params.rustfmt && name.ends_with(".rs") {
            format_rust(&name, content)
        } else {
            content
        };

        tracing::debug!(template = %raw_filename, output = %name, "rendered");
        Ok(Rendered { name, content })
    }
}

/// `name` under `destination_dir`; `.` and the empty string mean no prefix
pub fn output_path(destination_dir: &str, name: &str) -> String {
    let dir = destination_dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Pretty-print Rust source, leaving it untouched when it does not parse
fn format_rust(name: &str, content: String) -> String {
    match syn::parse_file(&content) {
        Ok(file) => prettyplease::unparse(&file),
        Err(e) => {
            tracing::warn!(output = name, error = %e, "not valid Rust, left unformatted");
            content
        }
    }
}
