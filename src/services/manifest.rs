//! Resolution of logical application names to compiled-object files.
//!
//! An application name resolves to an installed artifact directory (an
//! `ebin` directory under one of the configured library roots), and from
//! there to the set of `.beam` files the application contributes to a PLT.
//! Names already provided by the project's own applications are skipped:
//! project code is analyzed, not stored as background knowledge.

use crate::error::DialyzerError;
use crate::models::{FileSet, ProjectApp};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;

/// Logical application name → the compiled-object files it provides, in
/// resolution order.
#[derive(Debug, Clone, Default)]
pub struct ApplicationManifest {
    apps: IndexMap<String, Vec<Utf8PathBuf>>,
}

impl ApplicationManifest {
    pub fn contains_app(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    fn insert(&mut self, name: String, files: Vec<Utf8PathBuf>) {
        self.apps.insert(name, files);
    }

    /// Iterate `(name, files)` pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Utf8PathBuf])> {
        self.apps.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Flatten the manifest into the file set a PLT should contain.
    pub fn file_set(&self) -> FileSet {
        self.apps.values().flatten().cloned().collect()
    }
}

/// Resolves application names against the configured library directories.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    lib_dirs: Vec<Utf8PathBuf>,
}

impl ManifestResolver {
    pub fn new(lib_dirs: Vec<Utf8PathBuf>) -> Self {
        Self { lib_dirs }
    }

    /// Locate the artifact (`ebin`) directory for an application name.
    ///
    /// Within each library root, an exact `<root>/<name>/ebin` match wins;
    /// otherwise the highest-sorting `<root>/<name>-<version>/ebin` is taken.
    /// Roots are searched in configuration order.
    pub fn locate_artifacts(&self, name: &str) -> Result<Utf8PathBuf, DialyzerError> {
        for root in &self.lib_dirs {
            let exact = root.join(name).join("ebin");
            if exact.is_dir() {
                return Ok(exact);
            }

            if let Some(versioned) = best_versioned_dir(root, name) {
                let ebin = versioned.join("ebin");
                if ebin.is_dir() {
                    return Ok(ebin);
                }
            }
        }

        Err(DialyzerError::UnknownApplication(name.to_string()))
    }

    /// Resolve a list of application names into a per-app manifest.
    ///
    /// Names provided by `project_apps` and names already resolved are
    /// skipped, so each artifact directory is scanned at most once.
    pub fn resolve_manifest(
        &self,
        app_names: &[String],
        project_apps: &[ProjectApp],
    ) -> Result<ApplicationManifest, DialyzerError> {
        let mut manifest = ApplicationManifest::default();

        for name in app_names {
            if project_apps.iter().any(|app| &app.name == name) {
                tracing::debug!("Skipping {}: provided by the project", name);
                continue;
            }
            if manifest.contains_app(name) {
                continue;
            }

            let ebin_dir = self.locate_artifacts(name)?;
            let files = beam_files(&ebin_dir)
                .map_err(|_| DialyzerError::UnknownApplication(name.clone()))?;
            tracing::debug!("Resolved {} to {} file(s) in {}", name, files.len(), ebin_dir);
            manifest.insert(name.clone(), files);
        }

        Ok(manifest)
    }

    /// Resolve a list of application names into the flat file set their
    /// artifacts contribute to a PLT.
    pub fn resolve(
        &self,
        app_names: &[String],
        project_apps: &[ProjectApp],
    ) -> Result<FileSet, DialyzerError> {
        Ok(self.resolve_manifest(app_names, project_apps)?.file_set())
    }

    /// The project's own compiled-object files, the input of the
    /// success-typing pass.
    pub fn project_files(&self, project_apps: &[ProjectApp]) -> Result<FileSet, DialyzerError> {
        let mut files = FileSet::new();
        for app in project_apps {
            let beams = beam_files(&app.ebin_dir)
                .map_err(|_| DialyzerError::UnknownApplication(app.name.clone()))?;
            files.extend(beams.into_iter().collect());
        }
        Ok(files)
    }
}

/// List the `.beam` files in an artifact directory, sorted.
fn beam_files(dir: &Utf8Path) -> std::io::Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        if path.extension() == Some("beam") && entry.file_type()?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Highest-sorting `<root>/<name>-<version>` directory, if any.
fn best_versioned_dir(root: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
    let prefix = format!("{name}-");
    let mut best: Option<Utf8PathBuf> = None;

    for entry in fs::read_dir(root).ok()?.flatten() {
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        if !path.is_dir() {
            continue;
        }
        let Some(dir_name) = path.file_name() else {
            continue;
        };
        if dir_name.starts_with(&prefix) && best.as_deref().map(Utf8Path::as_str) < Some(path.as_str())
        {
            best = Some(path);
        }
    }

    best
}
