//! Schema lookup with a process-lifetime cache.
//!
//! A schema name (e.g. `se.novafaen.lamp.v1.json`) is looked up in order:
//!
//! 1. the explicit search path, when one is given
//! 2. the schemas bundled with the framework
//! 3. the working directory
//! 4. every directory below the working directory
//!
//! The first hit is parsed and cached by name. Entries are never evicted;
//! the set of names is fixed by the media types an application declares.

use crate::error::{SchemaError, SchemaResult};
use crate::validator::CompiledSchema;
use dashmap::DashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Schemas compiled into the framework.
const BUNDLED: &[(&str, &str)] = &[
    (
        "se.novafaen.smrt.error.v1.json",
        include_str!("../schemas/se.novafaen.smrt.error.v1.json"),
    ),
    (
        "se.novafaen.smrt.status.v1.json",
        include_str!("../schemas/se.novafaen.smrt.status.v1.json"),
    ),
];

/// Directories skipped during the working-directory walk.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Resolves schema names to parsed schema documents.
///
/// # Example
///
/// ```
/// use smrt_schema::SchemaResolver;
///
/// let resolver = SchemaResolver::new();
/// let schema = resolver
///     .resolve("se.novafaen.smrt.error.v1.json")
///     .unwrap()
///     .expect("bundled");
/// assert_eq!(schema["type"], "object");
/// ```
#[derive(Debug)]
pub struct SchemaResolver {
    search_path: Option<PathBuf>,
    root: PathBuf,
    cache: DashMap<String, Arc<Value>>,
    compiled: DashMap<String, Arc<CompiledSchema>>,
}

impl SchemaResolver {
    /// Creates a resolver rooted at the process working directory.
    #[must_use]
    pub fn new() -> Self {
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_root(root)
    }

    /// Creates a resolver rooted at `root` instead of the working directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            search_path: None,
            root: root.into(),
            cache: DashMap::new(),
            compiled: DashMap::new(),
        }
    }

    /// Sets the default explicit search path.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Resolves `name` using the default search path.
    pub fn resolve(&self, name: &str) -> SchemaResult<Option<Arc<Value>>> {
        self.resolve_in(name, self.search_path.as_deref())
    }

    /// Resolves `name`, consulting `search_path` first.
    ///
    /// Returns `Ok(None)` when no location holds the schema. A file that is
    /// found but cannot be read or parsed is an error and is not cached.
    pub fn resolve_in(
        &self,
        name: &str,
        search_path: Option<&Path>,
    ) -> SchemaResult<Option<Arc<Value>>> {
        if let Some(schema) = self.cache.get(name) {
            return Ok(Some(Arc::clone(schema.value())));
        }

        let Some(schema) = self.locate(name, search_path)? else {
            tracing::debug!(schema = name, "schema not found");
            return Ok(None);
        };

        let schema = Arc::new(schema);
        self.cache.insert(name.to_string(), Arc::clone(&schema));
        Ok(Some(schema))
    }

    /// Resolves `name` with the default search path and returns it compiled.
    ///
    /// Compilation happens once per name; later calls share the result.
    pub fn compiled(&self, name: &str) -> SchemaResult<Option<Arc<CompiledSchema>>> {
        if let Some(compiled) = self.compiled.get(name) {
            return Ok(Some(Arc::clone(compiled.value())));
        }

        let Some(document) = self.resolve(name)? else {
            return Ok(None);
        };

        let compiled = self
            .compiled
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CompiledSchema::new(&document)));
        Ok(Some(Arc::clone(compiled.value())))
    }

    /// Returns the number of cached schemas.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn locate(&self, name: &str, search_path: Option<&Path>) -> SchemaResult<Option<Value>> {
        if let Some(dir) = search_path {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return load(&candidate).map(Some);
            }
        }

        if let Some((_, text)) = BUNDLED.iter().find(|(bundled, _)| *bundled == name) {
            return serde_json::from_str(text)
                .map(Some)
                .map_err(|source| SchemaError::Bundled {
                    name: name.to_string(),
                    source,
                });
        }

        let candidate = self.root.join(name);
        if candidate.is_file() {
            return load(&candidate).map(Some);
        }

        match find_below(&self.root, name) {
            Some(path) => load(&path).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for SchemaResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn load(path: &Path) -> SchemaResult<Value> {
    tracing::debug!(path = %path.display(), "loading schema");
    let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SchemaError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Depth-first search for `name` in the directories below `root`.
///
/// Hidden and build directories are skipped. Siblings are visited in name
/// order so the result does not depend on directory iteration order.
fn find_below(root: &Path, name: &str) -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|entry| {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            !file_name.starts_with('.') && !SKIPPED_DIRS.contains(&file_name.as_ref())
        })
        .map(|entry| entry.path())
        .collect();
    dirs.sort();

    dirs.into_iter().find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            Some(candidate)
        } else {
            find_below(&dir, name)
        }
    })
}
