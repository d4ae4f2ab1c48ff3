// # -----------------------------
// # crates/core/src/lib.rs
// # -----------------------------
//! Uniform invocation of shells and script runtimes.
//!
//! ```no_run
//! use polyshell_core::InvocationOptions;
//!
//! let result = polyshell_core::exec("bash", "echo 'hello world'", &InvocationOptions::piped())?;
//! assert_eq!(result.stdout_lines[0], "hello world");
//! # Ok::<(), polyshell_core::ShellError>(())
//! ```

pub mod builtin;
pub mod config;
pub mod error;
pub mod launcher;
pub mod materialize;
pub mod path_map;
pub mod pipeline;
pub mod profile;
pub mod registry;
pub mod resolver;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;

pub use config::{PathMappingKind, ProfileConfig, ShellsConfig};
pub use error::{ErrorKind, ShellError, ShellResult};
pub use launcher::{LaunchRequest, ProcessLauncher, SystemLauncher};
pub use materialize::MaterializedScript;
pub use path_map::MapContext;
pub use pipeline::Shells;
pub use polyshell_common::Platform;
pub use profile::{
    Candidates, InterpreterProfile, Materializer, PathMapper, PathMapping, ScriptMaterializer,
};
pub use registry::Registry;
pub use resolver::ExecutableResolver;
pub use types::{InvocationOptions, InvocationResult, StdinMode, StdioMode};

static GLOBAL: Lazy<Shells> = Lazy::new(Shells::with_defaults);

/// Process-wide instance, built with the built-in profiles on first use.
pub fn global() -> &'static Shells {
    &GLOBAL
}

pub fn register(name: impl Into<String>, profile: InterpreterProfile) {
    global().register(name, profile)
}

pub fn lookup(name: &str) -> Option<Arc<InterpreterProfile>> {
    global().lookup(name)
}

pub fn list() -> Vec<String> {
    global().list()
}

pub fn run(
    name: &str,
    file: impl AsRef<Path>,
    options: &InvocationOptions,
) -> ShellResult<InvocationResult> {
    global().run(name, file, options)
}

pub async fn run_async(
    name: &str,
    file: impl AsRef<Path>,
    options: &InvocationOptions,
) -> ShellResult<InvocationResult> {
    global().run_async(name, file, options).await
}

pub fn exec(name: &str, script: &str, options: &InvocationOptions) -> ShellResult<InvocationResult> {
    global().exec(name, script, options)
}

pub async fn exec_async(
    name: &str,
    script: &str,
    options: &InvocationOptions,
) -> ShellResult<InvocationResult> {
    global().exec_async(name, script, options).await
}
