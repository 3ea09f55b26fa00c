//! Configuration loader
//!
//! Finds the search roots for a project.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::SearchRoots;
use crate::error::ConfigError;

/// Environment variable holding a platform path list of roots
pub const SEARCH_PATHS_ENV: &str = "SCHEMA_SEARCH_PATHS";

/// Per-project settings file, one root per line
pub const SEARCH_PATHS_FILE: &str = ".spatial/schema_paths";

/// YAML project file
pub const PROJECT_FILE: &str = "spatial-schema.yaml";

/// Contents of `spatial-schema.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub search_roots: Vec<PathBuf>,
}

pub struct ConfigLoader {
    project_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// Loader rooted at the current directory
    pub fn from_env() -> Result<Self> {
        let dir = std::env::current_dir().context("Failed to determine current directory")?;
        Ok(Self::new(dir))
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Load search roots
    ///
    /// Resolution order:
    /// 1. `explicit` roots (command line), if any
    /// 2. `SCHEMA_SEARCH_PATHS` environment variable
    /// 3. `.spatial/schema_paths` in the project directory
    /// 4. `search_roots` in `spatial-schema.yaml`
    ///
    /// The first source that yields anything wins. Relative roots are taken
    /// relative to the project directory.
    pub fn load(&self, explicit: &[PathBuf]) -> Result<SearchRoots> {
        self.load_with_env(explicit, std::env::var_os(SEARCH_PATHS_ENV))
    }

    /// [`load`](Self::load) with the environment value supplied by the caller
    pub fn load_with_env(&self, explicit: &[PathBuf], env: Option<OsString>) -> Result<SearchRoots> {
        let (source, roots) = self.find_roots(explicit, env)?;
        let roots = roots.relative_to(&self.project_dir);
        self.validate(&roots)?;
        info!("Loaded {} search root(s) from {}", roots.len(), source);
        Ok(roots)
    }

    fn find_roots(&self, explicit: &[PathBuf], env: Option<OsString>) -> Result<(String, SearchRoots)> {
        if !explicit.is_empty() {
            return Ok(("command line".into(), SearchRoots::from_paths(explicit.iter().cloned())));
        }

        if let Some(value) = env.filter(|v| !v.is_empty()) {
            let roots = SearchRoots::from_paths(std::env::split_paths(&value));
            if !roots.is_empty() {
                return Ok((SEARCH_PATHS_ENV.into(), roots));
            }
        }

        let paths_file = self.project_dir.join(SEARCH_PATHS_FILE);
        if paths_file.is_file() {
            let content = std::fs::read_to_string(&paths_file)
                .with_context(|| format!("Failed to read {}", paths_file.display()))?;
            let roots = SearchRoots::parse(&content);
            if !roots.is_empty() {
                return Ok((paths_file.display().to_string(), roots));
            }
            debug!("{} lists no roots", paths_file.display());
        }

        let project_file = self.project_dir.join(PROJECT_FILE);
        if project_file.is_file() {
            let project = Self::load_project_file(&project_file)?;
            let base = project_file.parent().unwrap_or(&self.project_dir);
            let roots = SearchRoots::from_paths(project.search_roots).relative_to(base);
            return Ok((project_file.display().to_string(), roots));
        }

        warn!(
            "No search roots configured for {}; imports will not resolve",
            self.project_dir.display()
        );
        Ok(("defaults".into(), SearchRoots::new()))
    }

    /// Parse a YAML project file
    pub fn load_project_file(path: &Path) -> Result<ProjectFile> {
        info!("Loading project configuration from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let project: ProjectFile = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::InvalidProjectFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        Ok(project)
    }

    /// Roots that exist must be directories; missing ones are only logged
    fn validate(&self, roots: &SearchRoots) -> Result<()> {
        for root in roots.iter() {
            if !root.exists() {
                warn!("Search root {} does not exist", root.display());
            } else if !root.is_dir() {
                return Err(ConfigError::NotADirectory(root.to_path_buf()).into());
            }
        }
        Ok(())
    }
}
