//! `run`/`exec` orchestration.
//!
//! ```text
//! exec: lookup -> materialize -> run
//! run:  lookup -> map path -> prefix_args ++ [mapped] ++ extra args -> launcher
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::builtin::register_builtins;
use crate::error::{ShellError, ShellResult};
use crate::launcher::{LaunchRequest, ProcessLauncher, SystemLauncher};
use crate::materialize::{materialize_for, materialize_for_async, MaterializedScript};
use crate::path_map::{map_path, map_path_async, MapContext};
use crate::profile::InterpreterProfile;
use crate::registry::Registry;
use crate::resolver::ExecutableResolver;
use crate::types::{InvocationOptions, InvocationResult};

/// Registry, resolver and launcher bundled behind one call surface.
pub struct Shells {
    registry: Registry,
    resolver: Arc<ExecutableResolver>,
    launcher: Arc<dyn ProcessLauncher>,
}

impl Default for Shells {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Shells {
    /// Empty registry, system launcher.
    pub fn new() -> Self {
        let resolver = Arc::new(ExecutableResolver::new());
        let launcher = Arc::new(SystemLauncher::new(Arc::clone(&resolver)));
        Self {
            registry: Registry::new(),
            resolver,
            launcher,
        }
    }

    /// Pre-populated with the built-in interpreter profiles.
    pub fn with_defaults() -> Self {
        let shells = Self::new();
        register_builtins(&shells.registry);
        shells
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Swaps the resolver. The launcher is rebuilt around it, so call this
    /// before [`with_launcher`](Self::with_launcher).
    pub fn with_resolver(mut self, resolver: ExecutableResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self.launcher = Arc::new(SystemLauncher::new(Arc::clone(&self.resolver)));
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolver(&self) -> &ExecutableResolver {
        &self.resolver
    }

    /// Inserts or replaces `name`. Any cached executable for it is dropped.
    pub fn register(&self, name: impl Into<String>, profile: InterpreterProfile) {
        let name = name.into();
        self.registry.register(name.clone(), profile);
        self.resolver.forget(&name);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<InterpreterProfile>> {
        self.registry.lookup(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.registry.list()
    }

    fn profile(&self, name: &str) -> ShellResult<Arc<InterpreterProfile>> {
        self.registry
            .lookup(name)
            .ok_or_else(|| ShellError::not_registered(name))
    }

    fn base_dir(name: &str) -> ShellResult<PathBuf> {
        std::env::current_dir().map_err(|source| ShellError::Launch {
            name: name.to_string(),
            source,
        })
    }

    fn assemble(
        profile: &InterpreterProfile,
        mapped: String,
        options: &InvocationOptions,
    ) -> Vec<String> {
        let mut argv = Vec::with_capacity(profile.prefix_args.len() + 1 + options.args.len());
        argv.extend(profile.prefix_args.iter().cloned());
        argv.push(mapped);
        argv.extend(options.args.iter().cloned());
        argv
    }

    fn argv(
        &self,
        profile: &InterpreterProfile,
        file: &Path,
        options: &InvocationOptions,
    ) -> ShellResult<Vec<String>> {
        let base = Self::base_dir(&profile.name)?;
        let ctx = MapContext {
            profile,
            resolver: &self.resolver,
            base_dir: &base,
        };
        let mapped = map_path(&ctx, &file.to_string_lossy())?;
        Ok(Self::assemble(profile, mapped, options))
    }

    async fn argv_async(
        &self,
        profile: &InterpreterProfile,
        file: &Path,
        options: &InvocationOptions,
    ) -> ShellResult<Vec<String>> {
        let base = Self::base_dir(&profile.name)?;
        let ctx = MapContext {
            profile,
            resolver: &self.resolver,
            base_dir: &base,
        };
        let mapped = map_path_async(&ctx, &file.to_string_lossy()).await?;
        Ok(Self::assemble(profile, mapped, options))
    }

    /// Argument vector `run` would hand to the launcher.
    pub fn command_line(
        &self,
        name: &str,
        file: impl AsRef<Path>,
        options: &InvocationOptions,
    ) -> ShellResult<Vec<String>> {
        let profile = self.profile(name)?;
        self.argv(&profile, file.as_ref(), options)
    }

    pub fn run(
        &self,
        name: &str,
        file: impl AsRef<Path>,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        let profile = self.profile(name)?;
        self.run_profile(&profile, file.as_ref(), options)
    }

    pub async fn run_async(
        &self,
        name: &str,
        file: impl AsRef<Path>,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        let profile = self.profile(name)?;
        self.run_profile_async(&profile, file.as_ref(), options)
            .await
    }

    fn run_profile(
        &self,
        profile: &InterpreterProfile,
        file: &Path,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        let argv = self.argv(profile, file, options)?;
        debug!(target: "polyshell", interpreter = %profile.name, argv = ?argv, "assembled command line");
        self.launcher.launch(&LaunchRequest {
            profile,
            args: &argv,
            options,
        })
    }

    async fn run_profile_async(
        &self,
        profile: &InterpreterProfile,
        file: &Path,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        let argv = self.argv_async(profile, file, options).await?;
        debug!(target: "polyshell", interpreter = %profile.name, argv = ?argv, "assembled command line");
        self.launcher
            .launch_async(&LaunchRequest {
                profile,
                args: &argv,
                options,
            })
            .await
    }

    pub fn exec(
        &self,
        name: &str,
        script: &str,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        self.exec_with_template(name, script, None, options)
    }

    pub async fn exec_async(
        &self,
        name: &str,
        script: &str,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        self.exec_with_template_async(name, script, None, options)
            .await
    }

    /// `exec` with `script` substituted into `template`'s `{{script}}`.
    pub fn exec_with_template(
        &self,
        name: &str,
        script: &str,
        template: Option<&str>,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        let profile = self.profile(name)?;
        let materialized = materialize_for(&profile, script, template)
            .map_err(|source| materialize_error(name, source))?;
        debug!(target: "polyshell", interpreter = %name, script = %materialized.path(), "materialized script");
        let result = self.run_profile(&profile, Path::new(materialized.path()), options);
        finish(name, materialized, options, result)
    }

    pub async fn exec_with_template_async(
        &self,
        name: &str,
        script: &str,
        template: Option<&str>,
        options: &InvocationOptions,
    ) -> ShellResult<InvocationResult> {
        let profile = self.profile(name)?;
        let materialized = materialize_for_async(&profile, script, template)
            .await
            .map_err(|source| materialize_error(name, source))?;
        debug!(target: "polyshell", interpreter = %name, script = %materialized.path(), "materialized script");
        let result = self
            .run_profile_async(&profile, Path::new(materialized.path()), options)
            .await;
        finish(name, materialized, options, result)
    }

    /// Path of the binary `name` resolves to.
    pub fn which(&self, name: &str) -> ShellResult<PathBuf> {
        let profile = self.profile(name)?;
        self.resolver.resolve(&profile)
    }

    pub async fn which_async(&self, name: &str) -> ShellResult<PathBuf> {
        let profile = self.profile(name)?;
        self.resolver.resolve_async(&profile).await
    }
}

fn materialize_error(name: &str, source: std::io::Error) -> ShellError {
    ShellError::Materialize {
        name: name.to_string(),
        source,
    }
}

/// Deletes the script, or persists it when the caller asked to keep it.
/// A failure to persist never replaces the outcome of the run.
fn finish(
    name: &str,
    script: MaterializedScript,
    options: &InvocationOptions,
    result: ShellResult<InvocationResult>,
) -> ShellResult<InvocationResult> {
    if options.keep_script {
        let path = script.path().to_string();
        match script.keep() {
            Ok(kept) => {
                debug!(target: "polyshell", interpreter = %name, script = %kept, "kept script")
            }
            Err(err) => warn!(
                target: "polyshell",
                interpreter = %name,
                script = %path,
                error = %err,
                "failed to keep script"
            ),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::materialize;
    use polyshell_common::Platform;
    use std::time::Duration;

    fn fake_exe(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, "").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn reregistration_drops_the_cached_binary() {
        let dir = tempfile::tempdir().unwrap();
        let old = fake_exe(dir.path(), "old-interp");
        let new = fake_exe(dir.path(), "new-interp");
        let platform = Platform::current();
        let shells = Shells::new();

        shells.register(
            "interp",
            InterpreterProfile::new("interp", ".x").with_candidates(platform, [old.clone()]),
        );
        assert_eq!(shells.which("interp").unwrap(), PathBuf::from(&old));

        shells.register(
            "interp",
            InterpreterProfile::new("interp", ".x").with_candidates(platform, [new.clone()]),
        );
        assert!(shells.resolver().cached("interp").is_none());
        assert_eq!(shells.which("interp").unwrap(), PathBuf::from(&new));
    }

    #[test]
    fn finish_returns_the_run_outcome_when_keeping() {
        let options = InvocationOptions::new().keep_script(true);

        let script = materialize("echo hi", ".sh", None).unwrap();
        let path = script.path().to_string();
        let ok = InvocationResult {
            code: 3,
            ..Default::default()
        };
        assert_eq!(finish("sh", script, &options, Ok(ok.clone())).unwrap(), ok);
        assert!(Path::new(&path).exists());
        std::fs::remove_file(&path).unwrap();

        let script = materialize("sleep 5", ".sh", None).unwrap();
        let path = script.path().to_string();
        let timed_out = ShellError::TimedOut {
            name: "sh".into(),
            timeout: Duration::from_millis(10),
        };
        let err = finish("sh", script, &options, Err(timed_out)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Timeout);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn finish_deletes_unkept_scripts() {
        let script = materialize("echo hi", ".sh", None).unwrap();
        let path = script.path().to_string();
        let result = finish(
            "sh",
            script,
            &InvocationOptions::new(),
            Ok(InvocationResult::default()),
        );
        assert!(result.is_ok());
        assert!(!Path::new(&path).exists());
    }
}
