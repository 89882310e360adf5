//! Parallel rendering of one batch
//!
//! A batch renders every discovered template against one [`Target`]. Tasks
//! share only read-only state, each owns its render context, and all of them
//! run to completion even after one has failed.

use super::context::Environment;
use super::render::{Rendered, Renderer};
use crate::schema::{FileDescriptor, Service};
use crate::GeneratorError;
use rayon::prelude::*;

/// Schema node bound to a batch
#[derive(Clone, Copy, Debug)]
pub enum Target<'a> {
    /// Whole-file rendering
    File(&'a FileDescriptor),
    /// Rendering for one service of a file
    Service {
        /// File declaring the service
        file: &'a FileDescriptor,
        /// Service being rendered
        service: &'a Service,
    },
}

impl<'a> Target<'a> {
    /// File the target belongs to
    pub fn file(&self) -> &'a FileDescriptor {
        match *self {
            Target::File(file) | Target::Service { file, .. } => file,
        }
    }

    /// Bound service, if any
    pub fn service(&self) -> Option<&'a Service> {
        match *self {
            Target::File(_) => None,
            Target::Service { service, .. } => Some(service),
        }
    }
}

/// Renders the template set for one target
pub struct Encoder<'r, 'a> {
    renderer: &'r Renderer<'a>,
    env: &'r Environment,
    target: Target<'r>,
}

impl<'r, 'a> Encoder<'r, 'a> {
    /// Batch bound to a whole file
    pub fn for_file(
        renderer: &'r Renderer<'a>,
        env: &'r Environment,
        file: &'r FileDescriptor,
    ) -> Self {
        tracing::debug!(file = file.name(), "new encoder");
        Self {
            renderer,
            env,
            target: Target::File(file),
        }
    }

    /// Batch bound to one service of `file`
    pub fn for_service(
        renderer: &'r Renderer<'a>,
        env: &'r Environment,
        file: &'r FileDescriptor,
        service: &'r Service,
    ) -> Self {
        tracing::debug!(file = file.name(), service = service.name(), "new encoder");
        Self {
            renderer,
            env,
            target: Target::Service { file, service },
        }
    }

    /// Render every template, in discovery order
    ///
    /// Fails with the first error in discovery order when any template
    /// fails; the outputs of the other templates are discarded.
    pub fn files(&self) -> Result<Vec<Rendered>, GeneratorError> {
        let outcomes: Vec<Result<Rendered, GeneratorError>> = self
            .renderer
            .templates()
            .par_iter()
            .map(|rel| self.renderer.render(&self.target, self.env, rel))
            .collect();

        let failures = outcomes.iter().filter(|o| o.is_err()).count();
        if failures > 0 {
            tracing::debug!(failures, total = outcomes.len(), "batch failed");
        }
        outcomes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use std::fs;

    fn env() -> Environment {
        Environment {
            build_date: chrono::Utc::now(),
            build_hostname: String::new(),
            build_user: String::new(),
            pwd: String::new(),
            module_path: None,
        }
    }

    fn file() -> FileDescriptor {
        FileDescriptor {
            name: Some("a.proto".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_outputs_follow_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c", "a", "b"] {
            fs::write(dir.path().join(format!("{name}.txt.tmpl")), name).unwrap();
        }
        let params = Params {
            template_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let renderer = Renderer::new(&params, None).unwrap();
        let (env, file) = (env(), file());

        let out = Encoder::for_file(&renderer, &env, &file).files().unwrap();
        let names: Vec<&str> = out.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_one_failure_fails_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..8 {
            fs::write(dir.path().join(format!("ok{i}.tmpl")), "fine").unwrap();
        }
        fs::write(dir.path().join("zz.tmpl"), "{{missing}}").unwrap();
        let params = Params {
            template_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let renderer = Renderer::new(&params, None).unwrap();
        let (env, file) = (env(), file());

        let err = Encoder::for_file(&renderer, &env, &file).files().unwrap_err();
        assert!(matches!(err, GeneratorError::Render { ref template, .. } if template == "zz.tmpl"));
    }

    #[test]
    fn test_first_error_in_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.tmpl"), "{{nope_a}}").unwrap();
        fs::write(dir.path().join("b.tmpl"), "{{nope_b}}").unwrap();
        let params = Params {
            template_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let renderer = Renderer::new(&params, None).unwrap();
        let (env, file) = (env(), file());

        let err = Encoder::for_file(&renderer, &env, &file).files().unwrap_err();
        assert!(matches!(err, GeneratorError::Render { ref template, .. } if template == "a.tmpl"));
    }
}
