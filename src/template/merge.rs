//! Output fan-in
//!
//! Several batches may target the same output path, for example every
//! service of a package appending to one shared file. The first write
//! registers the path; later writes append to it.

use super::render::Rendered;
use indexmap::IndexMap;
use prost_types::compiler::code_generator_response;

/// Outputs keyed by path, in first-seen order
#[derive(Debug, Default)]
pub struct OutputMerger {
    files: IndexMap<String, String>,
}

impl OutputMerger {
    /// Empty merger
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `output`, appending when its path is already known
    pub fn push(&mut self, output: Rendered) {
        match self.files.get_mut(&output.name) {
            Some(content) => {
                tracing::debug!(output = %output.name, "appending to existing output");
                content.push_str(&output.content);
            }
            None => {
                self.files.insert(output.name, output.content);
            }
        }
    }

    /// Push every output of a batch, in order
    pub fn extend(&mut self, outputs: impl IntoIterator<Item = Rendered>) {
        for output in outputs {
            self.push(output);
        }
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been pushed
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Response files, one per path, in first-seen order
    pub fn into_files(self) -> Vec<code_generator_response::File> {
        self.files
            .into_iter()
            .map(|(name, content)| code_generator_response::File {
                name: Some(name),
                content: Some(content),
                ..Default::default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out(name: &str, content: &str) -> Rendered {
        Rendered {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_duplicate_path_appends_in_arrival_order() {
        let mut merger = OutputMerger::new();
        merger.push(out("x.go", "foo"));
        merger.push(out("x.go", "bar"));

        let files = merger.into_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content.as_deref(), Some("foobar"));
    }

    #[test]
    fn test_same_output_twice_doubles_content() {
        let mut merger = OutputMerger::new();
        merger.extend([out("a.rs", "fn a() {}\n"), out("a.rs", "fn a() {}\n")]);

        let files = merger.into_files();
        assert_eq!(files[0].content.as_deref(), Some("fn a() {}\nfn a() {}\n"));
    }

    #[test]
    fn test_first_seen_order() {
        let mut merger = OutputMerger::new();
        merger.extend([out("b", "1"), out("a", "2"), out("b", "3"), out("c", "4")]);
        assert_eq!(merger.len(), 3);

        let names: Vec<String> = merger
            .into_files()
            .into_iter()
            .filter_map(|f| f.name)
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_empty() {
        let merger = OutputMerger::new();
        assert!(merger.is_empty());
        assert!(merger.into_files().is_empty());
    }
}
