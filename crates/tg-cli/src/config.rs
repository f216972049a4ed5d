//! CLI configuration via environment variables
//!
//! - `TG_PATH`   tg directory holding `src/`, `pkg/`, `bin/` and `build.ninja` (required)
//! - `TG_NINJA`  ninja executable, defaults to `ninja`
//! - `TG_LOG`    tracing filter overriding `-v`
//! - `CC`, `CXX` compilers overriding the host defaults

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tg_build::Toolchain;

/// Configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub tg_path: Option<PathBuf>,
    pub ninja: String,
    pub log_filter: Option<String>,
    pub cc: Option<String>,
    pub cxx: Option<String>,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            tg_path: var("TG_PATH").map(PathBuf::from),
            ninja: var("TG_NINJA").unwrap_or_else(|| "ninja".to_string()),
            log_filter: var("TG_LOG"),
            cc: var("CC"),
            cxx: var("CXX"),
        }
    }

    /// The tg directory, canonicalized
    pub fn tg_path(&self) -> Result<PathBuf> {
        let Some(tg_path) = &self.tg_path else {
            bail!("TG_PATH is not set");
        };
        let tg_path = tg_path
            .canonicalize()
            .with_context(|| format!("TG_PATH {} does not exist", tg_path.display()))?;
        if !tg_path.is_dir() {
            bail!("TG_PATH {} is not a directory", tg_path.display());
        }
        Ok(tg_path)
    }

    /// Source tree inside the tg directory
    pub fn src_path(tg_path: &Path) -> PathBuf {
        tg_path.join("src")
    }

    /// Host toolchain with compiler overrides applied
    pub fn toolchain(&self) -> Toolchain {
        let mut toolchain = Toolchain::host();
        if let Some(cc) = &self.cc {
            toolchain.cc = cc.clone();
        }
        if let Some(cxx) = &self.cxx {
            toolchain.cxx = cxx.clone();
        }
        if let Ok(exe) = env::current_exe() {
            toolchain.tg = exe.display().to_string();
        }
        toolchain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config(&[]);
        assert!(config.tg_path.is_none());
        assert_eq!(config.ninja, "ninja");
        assert!(config.log_filter.is_none());
        assert!(config.tg_path().is_err());
    }

    #[test]
    fn test_config_overrides() {
        let config = config(&[
            ("TG_PATH", "/tmp/tg"),
            ("TG_NINJA", "/opt/ninja"),
            ("TG_LOG", "tg_build=trace"),
            ("CC", "clang"),
            ("CXX", ""),
        ]);
        assert_eq!(config.tg_path, Some(PathBuf::from("/tmp/tg")));
        assert_eq!(config.ninja, "/opt/ninja");
        assert_eq!(config.log_filter.as_deref(), Some("tg_build=trace"));

        let toolchain = config.toolchain();
        assert_eq!(toolchain.cc, "clang");
        assert_eq!(toolchain.cxx, Toolchain::host().cxx);
    }

    #[test]
    fn test_tg_path_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");
        let config = config(&[("TG_PATH", missing.to_str().unwrap())]);
        assert!(config.tg_path().is_err());

        let config = Config {
            tg_path: Some(temp.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(config.tg_path().unwrap(), temp.path().canonicalize().unwrap());
    }
}
