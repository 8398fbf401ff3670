use camino::Utf8PathBuf;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Top-level configuration from autoplt.yaml
///
/// Everything is optional in the file; missing sections and keys fall back to
/// the defaults below, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialyzerConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,

    #[serde(default)]
    pub project: ProjectLayout,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub debug_mode: bool,
}

/// Analysis settings controlling PLT maintenance and warning emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Skip all PLT mutation when false; only the success-typing pass runs.
    #[serde(default = "default_true")]
    pub update_plt: bool,

    /// Skip the final whole-project success-typing pass when false.
    #[serde(default = "default_true")]
    pub succ_typings: bool,

    /// Whether PLT-maintenance phases also emit warnings. The success-typing
    /// pass always requests warnings regardless of this flag.
    #[serde(default)]
    pub get_warnings: bool,

    /// Enabled warning categories beyond the backend's built-ins.
    #[serde(default)]
    pub warnings: Vec<String>,

    /// Extra applications folded into the project PLT.
    #[serde(default)]
    pub plt_extra_apps: Vec<String>,

    #[serde(default)]
    pub plt_location: PltLocation,

    #[serde(default = "default_plt_prefix")]
    pub plt_prefix: String,

    /// Applications in the shared base PLT.
    #[serde(default = "default_base_plt_apps")]
    pub base_plt_apps: Vec<String>,

    #[serde(default)]
    pub base_plt_location: BasePltLocation,

    #[serde(default = "default_plt_prefix")]
    pub base_plt_prefix: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            update_plt: true,
            succ_typings: true,
            get_warnings: false,
            warnings: Vec::new(),
            plt_extra_apps: Vec::new(),
            plt_location: PltLocation::default(),
            plt_prefix: default_plt_prefix(),
            base_plt_apps: default_base_plt_apps(),
            base_plt_location: BasePltLocation::default(),
            base_plt_prefix: default_plt_prefix(),
        }
    }
}

/// Where the project PLT lives: the project build directory (`local`) or an
/// explicit directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PltLocation {
    #[default]
    Local,
    #[serde(untagged)]
    Dir(Utf8PathBuf),
}

/// Where the base PLT lives: the per-user cache directory shared across
/// projects (`global`) or an explicit directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasePltLocation {
    #[default]
    Global,
    #[serde(untagged)]
    Dir(Utf8PathBuf),
}

/// The project description a host build tool would otherwise inject: where
/// installed artifacts live and which applications (with their declared
/// dependencies) make up the project. This core consumes the list; it never
/// computes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLayout {
    /// Project-local build directory; holds the local PLT and the warnings
    /// output file.
    #[serde(default = "default_base_dir")]
    pub base_dir: Utf8PathBuf,

    /// Per-user cache directory; holds the global base PLT.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: Utf8PathBuf,

    /// Library directories searched when resolving application names to
    /// installed artifacts.
    #[serde(default)]
    pub lib_dirs: Vec<Utf8PathBuf>,

    #[serde(default)]
    pub apps: Vec<ProjectApp>,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            cache_dir: default_cache_dir(),
            lib_dirs: Vec::new(),
            apps: Vec::new(),
        }
    }
}

/// One project application and its declared dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectApp {
    pub name: String,

    /// Directory holding this application's compiled `.beam` files.
    pub ebin_dir: Utf8PathBuf,

    #[serde(default)]
    pub deps: Vec<String>,
}

/// Settings for the external analysis executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_dialyzer_bin")]
    pub dialyzer_bin: Utf8PathBuf,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            dialyzer_bin: default_dialyzer_bin(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_plt_prefix() -> String {
    // Matches the PLT naming used by rebar3 so existing caches are reused.
    "rebar3".to_string()
}

fn default_base_plt_apps() -> Vec<String> {
    ["erts", "crypto", "kernel", "stdlib"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_base_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("_build/dialyzer")
}

fn default_cache_dir() -> Utf8PathBuf {
    match std::env::var("HOME") {
        Ok(home) => Utf8PathBuf::from(home).join(".cache/autoplt"),
        Err(_) => Utf8PathBuf::from(".cache/autoplt"),
    }
}

fn default_dialyzer_bin() -> Utf8PathBuf {
    Utf8PathBuf::from("dialyzer")
}

impl DialyzerConfig {
    /// Path of the project PLT for the given runtime version.
    pub fn plt_path(&self, runtime_version: &str) -> Utf8PathBuf {
        let dir = match &self.analysis.plt_location {
            PltLocation::Local => &self.project.base_dir,
            PltLocation::Dir(dir) => dir,
        };
        dir.join(plt_name(&self.analysis.plt_prefix, runtime_version))
    }

    /// Path of the shared base PLT for the given runtime version.
    pub fn base_plt_path(&self, runtime_version: &str) -> Utf8PathBuf {
        let dir = match &self.analysis.base_plt_location {
            BasePltLocation::Global => &self.project.cache_dir,
            BasePltLocation::Dir(dir) => dir,
        };
        dir.join(plt_name(&self.analysis.base_plt_prefix, runtime_version))
    }

    /// Path of the warnings output file for the given runtime version.
    pub fn output_path(&self, runtime_version: &str) -> Utf8PathBuf {
        self.project
            .base_dir
            .join(format!("{runtime_version}.dialyzer_warnings"))
    }

    /// Application names whose artifacts belong in the project PLT: the base
    /// applications, the configured extras, and every declared dependency of
    /// every project application. Order-preserving and deduplicated so each
    /// name is scanned at most once during resolution.
    pub fn project_plt_apps(&self) -> Vec<String> {
        let mut names: IndexSet<String> = IndexSet::new();
        names.extend(self.analysis.base_plt_apps.iter().cloned());
        names.extend(self.analysis.plt_extra_apps.iter().cloned());
        for app in &self.project.apps {
            names.extend(app.deps.iter().cloned());
        }
        names.into_iter().collect()
    }

    /// Check if an application name is one of the project's own applications.
    pub fn is_project_app(&self, name: &str) -> bool {
        self.project.apps.iter().any(|app| app.name == name)
    }
}

fn plt_name(prefix: &str, runtime_version: &str) -> String {
    format!("{prefix}_{runtime_version}_plt")
}
