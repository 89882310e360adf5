//! Template set discovery

use super::{PARTIAL_SUFFIX, TEMPLATE_SUFFIX};
use crate::GeneratorError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Relative paths of every template under `root`, sorted
///
/// Directories are skipped. An existing root without templates yields an
/// empty list; an unreadable root is a [`GeneratorError::Discovery`].
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, GeneratorError> {
    let templates: Vec<PathBuf> = walk(root)?
        .into_iter()
        .filter(|rel| is_template(rel))
        .collect();
    for rel in &templates {
        tracing::debug!(template = %rel.display(), "new template");
    }
    Ok(templates)
}

/// Every partial under `root`, as `(partial name, absolute path)`
///
/// Only files ending in [`PARTIAL_SUFFIX`] qualify. Other non-template files
/// (images, READMEs) are never read.
pub fn partials(root: &Path) -> Result<Vec<(String, PathBuf)>, GeneratorError> {
    Ok(walk(root)?
        .into_iter()
        .filter(|rel| has_suffix(rel, PARTIAL_SUFFIX))
        .map(|rel| (template_name(&rel), root.join(rel)))
        .collect())
}

/// Forward-slash name of a relative path, as seen from templates
pub fn template_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_template(rel: &Path) -> bool {
    has_suffix(rel, TEMPLATE_SUFFIX)
}

fn has_suffix(rel: &Path, suffix: &str) -> bool {
    rel.file_name()
        .map(|name| name.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

fn walk(root: &Path) -> Result<Vec<PathBuf>, GeneratorError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| GeneratorError::Discovery {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_only_templates_are_discovered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.rs.tmpl");
        touch(dir.path(), "a.txt");
        touch(dir.path(), "nested/c.go.tmpl");
        touch(dir.path(), "nested/header.hbs");

        let found = discover(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![PathBuf::from("b.rs.tmpl"), PathBuf::from("nested/c.go.tmpl")]
        );
    }

    #[test]
    fn test_partials_need_their_suffix() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.rs.tmpl");
        touch(dir.path(), "nested/header.hbs");
        touch(dir.path(), "README.md");
        touch(dir.path(), "logo.png");

        let found = partials(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "nested/header.hbs");
        assert_eq!(found[0].1, dir.path().join("nested/header.hbs"));
    }

    #[test]
    fn test_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, GeneratorError::Discovery { .. }));
    }

    #[test]
    fn test_directory_named_like_template_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "dir.tmpl/inner.txt");
        assert!(discover(dir.path()).unwrap().is_empty());
    }
}
