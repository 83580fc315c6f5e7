use std::{
    ffi::OsStr,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use walkdir::WalkDir;

use super::{read, Encoding, ImportError};
use crate::SpecificationItem;

/// Expand the given inputs into a sorted list of files to import.
///
/// Files are taken as given. Directories are walked recursively for files
/// with a `.json`, `.yaml` or `.yml` extension; hidden entries are skipped.
#[must_use]
pub fn collect_input_paths(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = inputs
        .iter()
        .flat_map(|input| {
            if input.is_dir() {
                WalkDir::new(input)
                    .into_iter()
                    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()))
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file())
                    .filter(|entry| Encoding::from_path(entry.path()).is_some())
                    .map(walkdir::DirEntry::into_path)
                    .collect()
            } else {
                vec![input.clone()]
            }
        })
        .collect();

    paths.sort();
    paths.dedup();
    paths
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('.'))
}

/// Import the specification items of every input.
///
/// Files are parsed in parallel. Items are returned in sorted path order,
/// then in document order.
///
/// # Errors
///
/// Returns the first error encountered, in path order. No items are
/// returned in that case.
pub fn load_paths(inputs: &[PathBuf]) -> Result<Vec<SpecificationItem>, ImportError> {
    let paths = collect_input_paths(inputs);
    tracing::debug!("importing {} file(s)", paths.len());

    let loaded: Vec<Result<Vec<SpecificationItem>, ImportError>> =
        paths.par_iter().map(|path| load_file(path)).collect();

    let mut items = Vec::new();
    for result in loaded {
        items.extend(result?);
    }

    tracing::info!("imported {} specification item(s)", items.len());
    Ok(items)
}

fn load_file(path: &Path) -> Result<Vec<SpecificationItem>, ImportError> {
    let encoding =
        Encoding::from_path(path).ok_or_else(|| ImportError::UnsupportedFormat(path.to_path_buf()))?;

    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let items = read(encoding, BufReader::new(file))?;
    tracing::debug!("loaded {} item(s) from {}", items.len(), path.display());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const REQ: &str = r#"{"_version":"1","items":[{"id":{"name":"Req-1","type":"req","revision":0},"needs":["dsn"]}]}"#;
    const DSN: &str = "_version: '1'\nitems:\n  - id: {name: Dsn-1, type: dsn, revision: 0}\n    links:\n      - target: {name: Req-1, type: req}\n";

    #[test]
    fn walks_directories_for_supported_files() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("b.json"), REQ).unwrap();
        fs::write(root.join("nested/a.yaml"), DSN).unwrap();
        fs::write(root.join("notes.md"), "ignored").unwrap();
        fs::write(root.join(".hidden/c.json"), REQ).unwrap();

        let paths = collect_input_paths(&[root.to_path_buf()]);
        assert_eq!(
            paths,
            vec![root.join("b.json"), root.join("nested/a.yaml")]
        );
    }

    #[test]
    fn loads_items_in_path_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("1-dsn.yml"), DSN).unwrap();
        fs::write(root.join("2-req.json"), REQ).unwrap();

        let items = load_paths(&[root.to_path_buf()]).unwrap();
        let ids: Vec<_> = items.iter().map(|item| item.id().to_string()).collect();
        assert_eq!(ids, vec!["dsn~Dsn-1~0", "req~Req-1~0"]);
    }

    #[test]
    fn explicit_file_with_unknown_extension_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("items.txt");
        fs::write(&path, REQ).unwrap();

        let error = load_paths(&[path]).unwrap_err();
        assert!(matches!(error, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let error = load_paths(&[tmp.path().join("missing.json")]).unwrap_err();
        assert!(matches!(error, ImportError::Io { .. }));
    }
}
