//! # Profile configuration
//!
//! Extra or replacement interpreter profiles declared in TOML:
//!
//! ```toml
//! [interpreters.zsh]
//! extension = ".zsh"
//! args = ["-e"]
//! linux = ["/usr/bin/zsh"]
//! darwin = ["/bin/zsh"]
//! path_mapping = "native"
//! preamble = "setopt ERR_EXIT"
//! env_override = "ZSH_EXE"
//! platforms = ["linux", "darwin"]
//! ```
//!
//! ## Discovery
//!
//! First match wins:
//! 1. explicit path (CLI `--config`)
//! 2. `POLYSHELL_CONFIG`
//! 3. `polyshell.toml`, then `.polyshell/polyshell.toml`, in the working directory
//!
//! Configured profiles are registered after the built-ins, replacing any
//! built-in of the same name.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use polyshell_common::Platform;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ShellError, ShellResult};
use crate::pipeline::Shells;
use crate::profile::{Candidates, InterpreterProfile, Materializer, PathMapping};

pub const CONFIG_ENV: &str = "POLYSHELL_CONFIG";

/// Serializable name for the built-in path mapping strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathMappingKind {
    #[default]
    Native,
    DotSource,
    DotSourceResolved,
    CrossEnvironment,
}

impl From<PathMappingKind> for PathMapping {
    fn from(kind: PathMappingKind) -> Self {
        match kind {
            PathMappingKind::Native => PathMapping::Native,
            PathMappingKind::DotSource => PathMapping::DotSource,
            PathMappingKind::DotSourceResolved => PathMapping::DotSourceResolved,
            PathMappingKind::CrossEnvironment => PathMapping::CrossEnvironment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub extension: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub windows: Vec<String>,
    #[serde(default)]
    pub linux: Vec<String>,
    #[serde(default)]
    pub darwin: Vec<String>,
    #[serde(default)]
    pub freebsd: Vec<String>,
    #[serde(default)]
    pub path_mapping: PathMappingKind,
    #[serde(default)]
    pub preamble: Option<String>,
    #[serde(default)]
    pub postamble: Option<String>,
    #[serde(default)]
    pub env_override: Option<String>,
    #[serde(default)]
    pub platforms: Option<Vec<Platform>>,
}

impl ProfileConfig {
    pub fn into_profile(self, name: &str) -> InterpreterProfile {
        let mut candidates = Candidates::new();
        for (platform, list) in [
            (Platform::Windows, self.windows),
            (Platform::Linux, self.linux),
            (Platform::Darwin, self.darwin),
            (Platform::FreeBsd, self.freebsd),
        ] {
            if !list.is_empty() {
                candidates.insert(platform, list);
            }
        }

        let materializer = if self.preamble.is_some() || self.postamble.is_some() {
            Materializer::wrapped(
                self.preamble.unwrap_or_default(),
                self.postamble.unwrap_or_default(),
            )
        } else {
            Materializer::Verbatim
        };

        InterpreterProfile {
            name: name.to_string(),
            extension: self.extension,
            prefix_args: self.args,
            candidates,
            path_mapping: self.path_mapping.into(),
            materializer,
            env_override: self.env_override,
            platforms: self.platforms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellsConfig {
    pub interpreters: BTreeMap<String, ProfileConfig>,
}

impl ShellsConfig {
    pub fn from_toml_str(contents: &str) -> ShellResult<Self> {
        let config: ShellsConfig =
            toml::from_str(contents).map_err(|err| ShellError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> ShellResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            ShellError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&contents)
            .map_err(|err| ShellError::Config(format!("{}: {}", path.display(), err)))
    }

    /// Loads the first configuration found.
    ///
    /// An explicit path must exist; implicit locations are optional.
    pub fn from_sources(path_override: Option<PathBuf>) -> ShellResult<Option<(PathBuf, Self)>> {
        match Self::discover_config_path(path_override) {
            Some(path) => {
                let config = Self::load_from_path(&path)?;
                info!(
                    target: "polyshell",
                    path = %path.display(),
                    interpreters = config.interpreters.len(),
                    "loaded profile configuration"
                );
                Ok(Some((path, config)))
            }
            None => {
                debug!(target: "polyshell", "no profile configuration found");
                Ok(None)
            }
        }
    }

    fn discover_config_path(path_override: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = path_override {
            return Some(path);
        }

        if let Ok(from_env) = env::var(CONFIG_ENV) {
            let trimmed = from_env.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }

        let candidates = [
            PathBuf::from("polyshell.toml"),
            Path::new(".polyshell").join("polyshell.toml"),
        ];

        candidates.into_iter().find(|candidate| candidate.exists())
    }

    fn validate(&self) -> ShellResult<()> {
        for (name, profile) in &self.interpreters {
            if name.trim().is_empty() {
                return Err(ShellError::Config("interpreter name is empty".into()));
            }
            if !profile.extension.starts_with('.') {
                return Err(ShellError::Config(format!(
                    "interpreter '{}': extension '{}' must start with '.'",
                    name, profile.extension
                )));
            }
        }
        Ok(())
    }

    pub fn profiles(&self) -> Vec<InterpreterProfile> {
        self.interpreters
            .iter()
            .map(|(name, cfg)| cfg.clone().into_profile(name))
            .collect()
    }

    /// Registers every configured profile, replacing same-named entries.
    pub fn apply(&self, shells: &Shells) {
        for profile in self.profiles() {
            shells.register(profile.name.clone(), profile);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const SAMPLE: &str = r#"
        [interpreters.zsh]
        extension = ".zsh"
        args = ["-e"]
        linux = ["/usr/bin/zsh"]
        darwin = ["/bin/zsh"]
        preamble = "setopt ERR_EXIT"
        env_override = "ZSH_EXE"
        platforms = ["linux", "darwin"]

        [interpreters.pwsh]
        extension = ".ps1"
        args = ["-NoProfile", "-Command"]
        linux = ["/snap/bin/pwsh"]
        path_mapping = "dot-source-resolved"
    "#;

    #[test]
    fn parses_profiles() {
        let config = ShellsConfig::from_toml_str(SAMPLE).unwrap();
        let profiles = config.profiles();
        let zsh = profiles.iter().find(|p| p.name == "zsh").unwrap();

        assert_eq!(zsh.extension, ".zsh");
        assert_eq!(zsh.prefix_args, ["-e"]);
        assert_eq!(zsh.candidates_for(Platform::Darwin), ["/bin/zsh"]);
        assert_eq!(zsh.materializer, Materializer::wrapped("setopt ERR_EXIT", ""));
        assert_eq!(zsh.env_override.as_deref(), Some("ZSH_EXE"));
        assert!(!zsh.supports(Platform::Windows));

        let pwsh = profiles.iter().find(|p| p.name == "pwsh").unwrap();
        assert_eq!(pwsh.path_mapping, PathMapping::DotSourceResolved);
        assert_eq!(pwsh.materializer, Materializer::Verbatim);
    }

    #[test]
    fn rejects_unknown_fields_and_bad_extensions() {
        let unknown = "[interpreters.x]\nextension = \".x\"\nshell = true\n";
        assert!(ShellsConfig::from_toml_str(unknown).is_err());

        let bad_ext = "[interpreters.x]\nextension = \"x\"\n";
        let err = ShellsConfig::from_toml_str(bad_ext).unwrap_err();
        assert!(err.to_string().contains("must start with '.'"));
    }

    #[test]
    fn apply_replaces_builtins() {
        let shells = Shells::with_defaults();
        ShellsConfig::from_toml_str(SAMPLE).unwrap().apply(&shells);

        assert!(shells.lookup("zsh").is_some());
        let pwsh = shells.lookup("pwsh").unwrap();
        assert_eq!(pwsh.candidates_for(Platform::Linux), ["/snap/bin/pwsh"]);
        assert!(pwsh.candidates_for(Platform::Windows).is_empty());
    }

    #[test]
    fn explicit_path_must_exist() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let err = ShellsConfig::from_sources(Some(PathBuf::from("/no/such/polyshell.toml")))
            .unwrap_err();
        assert!(matches!(err, ShellError::Config(_)));
    }

    #[test]
    fn env_variable_points_at_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().expect("tempdir");
        let cfg_path = dir.path().join("custom.toml");
        fs::write(&cfg_path, SAMPLE).expect("write config");

        env::set_var(CONFIG_ENV, &cfg_path);
        let loaded = ShellsConfig::from_sources(None);
        env::remove_var(CONFIG_ENV);

        let (path, config) = loaded.unwrap().unwrap();
        assert_eq!(path, cfg_path);
        assert_eq!(config.interpreters.len(), 2);
    }
}
