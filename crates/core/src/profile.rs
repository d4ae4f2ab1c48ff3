use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use polyshell_common::Platform;

use crate::error::ShellResult;
use crate::materialize::MaterializedScript;
use crate::path_map::MapContext;

/// Candidate executable patterns per platform, in priority order.
pub type Candidates = BTreeMap<Platform, Vec<String>>;

/// User-supplied replacement for the built-in path mapping strategies.
#[async_trait]
pub trait PathMapper: Send + Sync {
    fn map(&self, ctx: &MapContext<'_>, path: &str) -> ShellResult<String>;

    async fn map_async(&self, ctx: &MapContext<'_>, path: &str) -> ShellResult<String> {
        self.map(ctx, path)
    }
}

/// User-supplied replacement for the generic script materializer.
#[async_trait]
pub trait ScriptMaterializer: Send + Sync {
    fn materialize(
        &self,
        script: &str,
        extension: &str,
        template: Option<&str>,
    ) -> io::Result<MaterializedScript>;

    async fn materialize_async(
        &self,
        script: &str,
        extension: &str,
        template: Option<&str>,
    ) -> io::Result<MaterializedScript> {
        self.materialize(script, extension, template)
    }
}

/// How a script path is turned into argument-vector tokens.
#[derive(Clone, Default)]
pub enum PathMapping {
    /// Absolute path with forward slashes.
    #[default]
    Native,
    /// `. <path>` as a single token, path passed through as given.
    DotSource,
    /// `. <absolute path>` as a single token.
    DotSourceResolved,
    /// [`PathMapping::Native`], then `/mnt/<drive>/...` when the resolved
    /// binary is the Windows system `bash.exe`.
    CrossEnvironment,
    Custom(Arc<dyn PathMapper>),
}

impl fmt::Debug for PathMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMapping::Native => f.write_str("Native"),
            PathMapping::DotSource => f.write_str("DotSource"),
            PathMapping::DotSourceResolved => f.write_str("DotSourceResolved"),
            PathMapping::CrossEnvironment => f.write_str("CrossEnvironment"),
            PathMapping::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for PathMapping {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PathMapping::Custom(a), PathMapping::Custom(b)) => Arc::ptr_eq(a, b),
            (PathMapping::Native, PathMapping::Native)
            | (PathMapping::DotSource, PathMapping::DotSource)
            | (PathMapping::DotSourceResolved, PathMapping::DotSourceResolved)
            | (PathMapping::CrossEnvironment, PathMapping::CrossEnvironment) => true,
            _ => false,
        }
    }
}

/// How an inline script becomes a file.
#[derive(Clone, Default)]
pub enum Materializer {
    /// Script written as-is (or substituted into the template).
    #[default]
    Verbatim,
    /// Script surrounded by interpreter-specific text before writing.
    Wrapped {
        preamble: String,
        postamble: String,
    },
    Custom(Arc<dyn ScriptMaterializer>),
}

impl Materializer {
    pub fn wrapped(preamble: impl Into<String>, postamble: impl Into<String>) -> Self {
        Materializer::Wrapped {
            preamble: preamble.into(),
            postamble: postamble.into(),
        }
    }
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Materializer::Verbatim => f.write_str("Verbatim"),
            Materializer::Wrapped {
                preamble,
                postamble,
            } => f
                .debug_struct("Wrapped")
                .field("preamble", preamble)
                .field("postamble", postamble)
                .finish(),
            Materializer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Materializer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Materializer::Verbatim, Materializer::Verbatim) => true,
            (
                Materializer::Wrapped {
                    preamble: pa,
                    postamble: qa,
                },
                Materializer::Wrapped {
                    preamble: pb,
                    postamble: qb,
                },
            ) => pa == pb && qa == qb,
            (Materializer::Custom(a), Materializer::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Registered configuration for one named interpreter.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpreterProfile {
    pub name: String,
    /// Suffix for materialized scripts, including the dot.
    pub extension: String,
    /// Tokens placed before the script path.
    pub prefix_args: Vec<String>,
    pub candidates: Candidates,
    pub path_mapping: PathMapping,
    pub materializer: Materializer,
    /// Variable naming an explicit executable path; wins over candidates.
    pub env_override: Option<String>,
    /// When set, the only platforms this interpreter can exist on.
    pub platforms: Option<Vec<Platform>>,
}

impl InterpreterProfile {
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            prefix_args: Vec::new(),
            candidates: Candidates::new(),
            path_mapping: PathMapping::default(),
            materializer: Materializer::default(),
            env_override: None,
            platforms: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_candidates<I, S>(mut self, platform: Platform, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates
            .insert(platform, candidates.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_path_mapping(mut self, mapping: PathMapping) -> Self {
        self.path_mapping = mapping;
        self
    }

    pub fn with_materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn with_env_override(mut self, var: impl Into<String>) -> Self {
        self.env_override = Some(var.into());
        self
    }

    pub fn restricted_to<I>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = Platform>,
    {
        self.platforms = Some(platforms.into_iter().collect());
        self
    }

    /// Candidates for `platform`, falling back to the related platform's
    /// list when none are declared.
    pub fn candidates_for(&self, platform: Platform) -> &[String] {
        if let Some(list) = self.candidates.get(&platform) {
            return list;
        }
        platform
            .fallback()
            .and_then(|fallback| self.candidates.get(&fallback))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn supports(&self, platform: Platform) -> bool {
        self.platforms
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&platform))
    }
}
