//! Writes inline scripts to temporary files.

use std::io;
use std::path::Path;

use polyshell_common::fs::{
    create_temp_file, set_executable, set_executable_async, write_text, write_text_async,
};
use polyshell_common::normalize_separators;
use tempfile::TempPath;

use crate::profile::{InterpreterProfile, Materializer};

/// Filename prefix of every materialized script.
pub const SCRIPT_PREFIX: &str = "polyshell_scripts";

/// Placeholder replaced by the script text when a template is supplied.
pub const TEMPLATE_PLACEHOLDER: &str = "{{script}}";

/// A script written to disk.
///
/// Owns the file: it is deleted when this value drops unless
/// [`keep`](Self::keep) was called.
#[derive(Debug)]
pub struct MaterializedScript {
    path: String,
    file: Option<TempPath>,
}

impl MaterializedScript {
    fn from_temp(file: TempPath) -> Self {
        Self {
            path: normalize_separators(&file.to_string_lossy()),
            file: Some(file),
        }
    }

    /// Wraps a file this crate does not own. It is never deleted.
    pub fn unmanaged(path: impl AsRef<Path>) -> Self {
        Self {
            path: normalize_separators(&path.as_ref().to_string_lossy()),
            file: None,
        }
    }

    /// Path with forward slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Persists the file past this value's lifetime and returns its path.
    pub fn keep(mut self) -> io::Result<String> {
        if let Some(file) = self.file.take() {
            file.keep().map_err(|err| err.error)?;
        }
        Ok(std::mem::take(&mut self.path))
    }
}

/// Substitutes `script` into the first placeholder of `template`.
pub fn render(script: &str, template: Option<&str>) -> String {
    match template {
        Some(tpl) => tpl.replacen(TEMPLATE_PLACEHOLDER, script, 1),
        None => script.to_string(),
    }
}

/// Surrounds `script` with interpreter preamble/postamble lines.
pub fn wrap(script: &str, preamble: &str, postamble: &str) -> String {
    let mut body = String::with_capacity(preamble.len() + script.len() + postamble.len() + 3);
    if !preamble.is_empty() {
        body.push_str(preamble);
        body.push('\n');
    }
    body.push_str(script);
    body.push('\n');
    if !postamble.is_empty() {
        body.push_str(postamble);
        body.push('\n');
    }
    body
}

/// Generic materializer: temp file named `polyshell_scripts*<extension>`,
/// template substitution, executable bit on Unix.
pub fn materialize(
    script: &str,
    extension: &str,
    template: Option<&str>,
) -> io::Result<MaterializedScript> {
    let file = create_temp_file(SCRIPT_PREFIX, extension)?;
    write_text(&file, &render(script, template))?;
    set_executable(&file)?;
    Ok(MaterializedScript::from_temp(file))
}

pub async fn materialize_async(
    script: &str,
    extension: &str,
    template: Option<&str>,
) -> io::Result<MaterializedScript> {
    let file = create_temp_file(SCRIPT_PREFIX, extension)?;
    write_text_async(&file, &render(script, template)).await?;
    set_executable_async(&file).await?;
    Ok(MaterializedScript::from_temp(file))
}

/// Materializes `script` the way `profile` asks for.
pub fn materialize_for(
    profile: &InterpreterProfile,
    script: &str,
    template: Option<&str>,
) -> io::Result<MaterializedScript> {
    match &profile.materializer {
        Materializer::Verbatim => materialize(script, &profile.extension, template),
        Materializer::Wrapped {
            preamble,
            postamble,
        } => materialize(
            &wrap(script, preamble, postamble),
            &profile.extension,
            template,
        ),
        Materializer::Custom(hook) => hook.materialize(script, &profile.extension, template),
    }
}

pub async fn materialize_for_async(
    profile: &InterpreterProfile,
    script: &str,
    template: Option<&str>,
) -> io::Result<MaterializedScript> {
    match &profile.materializer {
        Materializer::Verbatim => materialize_async(script, &profile.extension, template).await,
        Materializer::Wrapped {
            preamble,
            postamble,
        } => {
            materialize_async(
                &wrap(script, preamble, postamble),
                &profile.extension,
                template,
            )
            .await
        }
        Materializer::Custom(hook) => {
            hook.materialize_async(script, &profile.extension, template)
                .await
        }
    }
}
