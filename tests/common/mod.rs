//! Shared test scaffolding: an in-memory analysis backend and a scratch
//! project layout.

#![allow(dead_code)]

use autoplt::error::DialyzerError;
use autoplt::models::{DialyzerConfig, FileSet, ProjectApp};
use autoplt::services::{AnalysisBackend, AnalysisPhase, AnalysisRequest};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Marker content that makes [`FakeBackend`] treat a PLT as unreadable.
pub const CORRUPT_PLT: &str = "CORRUPT";

/// Analysis backend double.
///
/// PLT "contents" are persisted as one path per line in the PLT file itself,
/// so the orchestrator's real base-to-project copy is exercised and the
/// resulting file can be inspected. Every request is recorded; warnings are
/// replayed per phase from a script.
pub struct FakeBackend {
    version: String,
    pub requests: Mutex<Vec<AnalysisRequest>>,
    warnings_by_phase: Mutex<BTreeMap<&'static str, Vec<String>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            version: "26.2".to_string(),
            requests: Mutex::new(Vec::new()),
            warnings_by_phase: Mutex::new(BTreeMap::new()),
        }
    }

    /// Replay these warnings on every invocation of `phase`.
    pub fn script_warnings(&self, phase: AnalysisPhase, warnings: &[&str]) {
        self.warnings_by_phase
            .lock()
            .unwrap()
            .insert(phase.name(), warnings.iter().map(|s| s.to_string()).collect());
    }

    pub fn phases(&self) -> Vec<AnalysisPhase> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.phase)
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn read_plt(path: &Utf8Path) -> FileSet {
        match fs::read_to_string(path) {
            Ok(contents) => contents
                .lines()
                .filter(|l| !l.is_empty())
                .map(Utf8PathBuf::from)
                .collect(),
            Err(_) => FileSet::new(),
        }
    }

    fn write_plt(path: &Utf8Path, files: &FileSet) {
        let mut contents = String::new();
        for file in files.iter() {
            contents.push_str(file.as_str());
            contents.push('\n');
        }
        fs::write(path, contents).unwrap();
    }
}

impl AnalysisBackend for FakeBackend {
    async fn runtime_version(&self) -> Result<String, DialyzerError> {
        Ok(self.version.clone())
    }

    async fn plt_file_set(&self, plt: &Utf8Path) -> Result<Option<FileSet>, DialyzerError> {
        if !plt.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(plt).unwrap_or_default();
        if contents.trim() == CORRUPT_PLT {
            return Err(DialyzerError::PltRead {
                path: plt.to_path_buf(),
                message: "not a PLT file".to_string(),
            });
        }
        Ok(Some(Self::read_plt(plt)))
    }

    async fn run_analysis(&self, request: &AnalysisRequest) -> Result<Vec<String>, DialyzerError> {
        assert!(
            !request.files.is_empty(),
            "backend invoked with an empty file list ({} phase)",
            request.phase.name()
        );
        self.requests.lock().unwrap().push(request.clone());

        // Mirror the real backend's PLT mutation so later phases and runs
        // observe the new state.
        match request.phase {
            AnalysisPhase::Build => {
                let plt = request.output_plt.as_ref().expect("build needs output_plt");
                let files: FileSet = request.files.iter().cloned().collect();
                Self::write_plt(plt, &files);
            }
            AnalysisPhase::Add => {
                let plt = request.output_plt.as_ref().expect("add needs output_plt");
                let mut files = Self::read_plt(plt);
                for file in &request.files {
                    files.insert(file.clone());
                }
                Self::write_plt(plt, &files);
            }
            AnalysisPhase::Remove => {
                let plt = request.output_plt.as_ref().expect("remove needs output_plt");
                let current = Self::read_plt(plt);
                let doomed: FileSet = request.files.iter().cloned().collect();
                Self::write_plt(plt, &current.difference(&doomed));
            }
            AnalysisPhase::Check | AnalysisPhase::SuccTypings => {}
        }

        let warnings = self
            .warnings_by_phase
            .lock()
            .unwrap()
            .get(request.phase.name())
            .cloned()
            .unwrap_or_default();
        Ok(warnings)
    }
}

/// Console sink whose output the test can read back.
#[derive(Clone, Default)]
pub struct SharedConsole(Arc<Mutex<Vec<u8>>>);

impl SharedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedConsole {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A scratch on-disk project: installed base applications, one dependency,
/// one project application, and a configuration pointing at all of it.
pub struct TestProject {
    // Held for its Drop: removes the tree when the test ends.
    _temp: TempDir,
    pub root: Utf8PathBuf,
    pub config: DialyzerConfig,
}

impl TestProject {
    pub fn plt_path(&self) -> Utf8PathBuf {
        self.config.plt_path("26.2")
    }

    pub fn base_plt_path(&self) -> Utf8PathBuf {
        self.config.base_plt_path("26.2")
    }

    pub fn output_path(&self) -> Utf8PathBuf {
        self.config.output_path("26.2")
    }

    /// Pre-seed a PLT file with the given contents, as a previous run of the
    /// fake backend would have left it.
    pub fn seed_plt(&self, plt: &Utf8Path, files: &FileSet) {
        fs::create_dir_all(plt.parent().unwrap()).unwrap();
        let mut handle = fs::File::create(plt).unwrap();
        for file in files.iter() {
            writeln!(handle, "{file}").unwrap();
        }
    }

    pub fn plt_contents(&self, plt: &Utf8Path) -> FileSet {
        fs::read_to_string(plt)
            .unwrap()
            .lines()
            .filter(|l| !l.is_empty())
            .map(Utf8PathBuf::from)
            .collect()
    }

    /// Beam files installed for an application under `lib/`.
    pub fn installed_files(&self, app: &str, modules: &[&str]) -> FileSet {
        modules
            .iter()
            .map(|m| self.root.join(format!("lib/{app}/ebin/{m}.beam")))
            .collect()
    }
}

/// Install `<root>/<dir>/ebin/<module>.beam` artifacts.
pub fn install_app(root: &Utf8Path, dir: &str, modules: &[&str]) -> Utf8PathBuf {
    let ebin = root.join(dir).join("ebin");
    fs::create_dir_all(&ebin).unwrap();
    for module in modules {
        fs::write(ebin.join(format!("{module}.beam")), b"beam").unwrap();
    }
    ebin
}

/// Base applications every scratch project installs, one module each.
pub const BASE_APPS: &[&str] = &["erts", "crypto", "kernel", "stdlib"];

pub fn test_project() -> TestProject {
    let temp = TempDir::new().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();

    let lib_root = root.join("lib");
    for app in BASE_APPS {
        install_app(&lib_root, app, &[app]);
    }
    install_app(&lib_root, "cowboy", &["cowboy", "cowboy_req"]);

    let myapp_ebin = install_app(&root, "myapp", &["myapp", "myapp_sup"]);

    let mut config = DialyzerConfig::default();
    config.project.base_dir = root.join("_build/dialyzer");
    config.project.cache_dir = root.join("cache");
    config.project.lib_dirs = vec![lib_root];
    config.project.apps = vec![ProjectApp {
        name: "myapp".to_string(),
        ebin_dir: myapp_ebin,
        deps: vec!["cowboy".to_string()],
    }];

    TestProject {
        _temp: temp,
        root,
        config,
    }
}
