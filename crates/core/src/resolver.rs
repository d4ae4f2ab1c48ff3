//! Executable discovery for registered interpreters.
//!
//! Resolution order:
//! 1. per-name cache
//! 2. platform restriction (fails with `UnsupportedPlatform`)
//! 3. the profile's override variable
//! 4. platform candidates, env-expanded, first existing file
//! 5. PATH search for the profile name
//!
//! Exhausting all of them fails with `NotFoundOnPath`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use polyshell_common::{expand_env, Platform};
use tracing::{debug, warn};

use crate::error::{ShellError, ShellResult};
use crate::profile::InterpreterProfile;

const PATH_MARKER: &str = "PATH";

#[derive(Debug)]
pub struct ExecutableResolver {
    platform: Platform,
    cache: RwLock<HashMap<String, PathBuf>>,
}

impl Default for ExecutableResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutableResolver {
    pub fn new() -> Self {
        Self::for_platform(Platform::current())
    }

    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn cached(&self, name: &str) -> Option<PathBuf> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Evicts the cached path for `name`.
    pub fn forget(&self, name: &str) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn remember(&self, name: &str, path: &Path) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), path.to_path_buf());
    }

    pub fn resolve(&self, profile: &InterpreterProfile) -> ShellResult<PathBuf> {
        if let Some(hit) = self.cached(&profile.name) {
            return Ok(hit);
        }
        self.check_platform(profile)?;

        let mut searched = Vec::new();
        for candidate in self.expanded_candidates(profile, &mut searched) {
            if Path::new(&candidate).is_file() {
                return Ok(self.found(profile, PathBuf::from(candidate)));
            }
        }

        searched.push(PATH_MARKER.to_string());
        match which::which(&profile.name) {
            Ok(path) => Ok(self.found(profile, path)),
            Err(_) => Err(self.not_found(profile, searched)),
        }
    }

    /// Same as [`resolve`](Self::resolve); filesystem probes are awaited and
    /// the PATH search runs on the blocking pool.
    pub async fn resolve_async(&self, profile: &InterpreterProfile) -> ShellResult<PathBuf> {
        if let Some(hit) = self.cached(&profile.name) {
            return Ok(hit);
        }
        self.check_platform(profile)?;

        let mut searched = Vec::new();
        for candidate in self.expanded_candidates(profile, &mut searched) {
            let is_file = tokio::fs::metadata(&candidate)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if is_file {
                return Ok(self.found(profile, PathBuf::from(candidate)));
            }
        }

        searched.push(PATH_MARKER.to_string());
        let name = profile.name.clone();
        let lookup = tokio::task::spawn_blocking(move || which::which(name)).await;
        match lookup {
            Ok(Ok(path)) => Ok(self.found(profile, path)),
            Ok(Err(_)) => Err(self.not_found(profile, searched)),
            Err(err) => {
                warn!(target: "polyshell", interpreter = %profile.name, error = %err, "PATH search task failed");
                Err(self.not_found(profile, searched))
            }
        }
    }

    fn check_platform(&self, profile: &InterpreterProfile) -> ShellResult<()> {
        if profile.supports(self.platform) {
            Ok(())
        } else {
            Err(ShellError::UnsupportedPlatform {
                name: profile.name.clone(),
                platform: self.platform,
            })
        }
    }

    /// Override variable first, then platform candidates. Patterns whose
    /// variables are unset are skipped.
    fn expanded_candidates(
        &self,
        profile: &InterpreterProfile,
        searched: &mut Vec<String>,
    ) -> Vec<String> {
        let mut expanded = Vec::new();

        if let Some(var) = &profile.env_override {
            match std::env::var(var) {
                Ok(value) if !value.is_empty() => expanded.push(value),
                _ => {}
            }
        }

        for pattern in profile.candidates_for(self.platform) {
            match expand_env(pattern) {
                Some(path) => expanded.push(path),
                None => {
                    debug!(
                        target: "polyshell",
                        interpreter = %profile.name,
                        pattern = %pattern,
                        "skipping candidate with unset variable"
                    );
                    searched.push(pattern.clone());
                }
            }
        }

        searched.extend(expanded.iter().cloned());
        expanded
    }

    fn found(&self, profile: &InterpreterProfile, path: PathBuf) -> PathBuf {
        debug!(
            target: "polyshell",
            interpreter = %profile.name,
            path = %path.display(),
            "resolved executable"
        );
        self.remember(&profile.name, &path);
        path
    }

    fn not_found(&self, profile: &InterpreterProfile, searched: Vec<String>) -> ShellError {
        warn!(
            target: "polyshell",
            interpreter = %profile.name,
            platform = %self.platform,
            "executable not found"
        );
        ShellError::NotFoundOnPath {
            name: profile.name.clone(),
            searched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const MISSING: &str = "polyshell-definitely-missing-interpreter";

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("missing-bin");
        let second = dir.path().join("present-bin");
        std::fs::write(&second, "").unwrap();

        let platform = Platform::current();
        let profile = InterpreterProfile::new(MISSING, ".x").with_candidates(
            platform,
            [
                first.to_string_lossy().into_owned(),
                second.to_string_lossy().into_owned(),
            ],
        );

        let resolver = ExecutableResolver::new();
        assert_eq!(resolver.resolve(&profile).unwrap(), second);
        assert_eq!(resolver.cached(MISSING), Some(second));
    }

    #[test]
    fn cache_survives_file_removal_until_forgotten() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("interp");
        std::fs::write(&exe, "").unwrap();
        let profile = InterpreterProfile::new(MISSING, ".x")
            .with_candidates(Platform::current(), [exe.to_string_lossy().into_owned()]);

        let resolver = ExecutableResolver::new();
        resolver.resolve(&profile).unwrap();
        std::fs::remove_file(&exe).unwrap();
        assert_eq!(resolver.resolve(&profile).unwrap(), exe);

        resolver.forget(MISSING);
        let err = resolver.resolve(&profile).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn missing_everywhere_is_not_found() {
        let profile = InterpreterProfile::new(MISSING, ".x")
            .with_candidates(Platform::current(), ["/nonexistent/polyshell/bin"]);
        let err = ExecutableResolver::new().resolve(&profile).unwrap_err();
        match err {
            ShellError::NotFoundOnPath { name, searched } => {
                assert_eq!(name, MISSING);
                assert_eq!(searched, ["/nonexistent/polyshell/bin", "PATH"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn restricted_profile_is_unsupported_elsewhere() {
        let profile = InterpreterProfile::new("cmd", ".cmd").restricted_to([Platform::Windows]);
        let err = ExecutableResolver::for_platform(Platform::Linux)
            .resolve(&profile)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformNotSupported);
    }

    #[test]
    fn env_override_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("custom-interp");
        std::fs::write(&exe, "").unwrap();
        let var = "POLYSHELL_TEST_OVERRIDE_EXE";
        std::env::set_var(var, &exe);

        let profile = InterpreterProfile::new(MISSING, ".x")
            .with_candidates(Platform::current(), ["/nonexistent/polyshell/bin"])
            .with_env_override(var);
        let resolved = ExecutableResolver::new().resolve(&profile).unwrap();
        std::env::remove_var(var);
        assert_eq!(resolved, exe);
    }

    #[tokio::test]
    async fn async_resolution_matches_sync() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("interp");
        std::fs::write(&exe, "").unwrap();
        let profile = InterpreterProfile::new(MISSING, ".x")
            .with_candidates(Platform::current(), [exe.to_string_lossy().into_owned()]);

        let resolver = ExecutableResolver::new();
        assert_eq!(resolver.resolve_async(&profile).await.unwrap(), exe);

        let missing = InterpreterProfile::new(MISSING, ".x");
        let err = ExecutableResolver::new()
            .resolve_async(&missing)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
