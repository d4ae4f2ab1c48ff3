//! Turns a script path into the argv token an interpreter expects.

use std::path::Path;

use polyshell_common::{absolutize_from, is_system_bash, normalize_separators, to_mount_path};

use crate::error::ShellResult;
use crate::profile::{InterpreterProfile, PathMapping};
use crate::resolver::ExecutableResolver;

/// Inputs available to a path mapper.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub profile: &'a InterpreterProfile,
    pub resolver: &'a ExecutableResolver,
    /// Directory relative paths are resolved against.
    pub base_dir: &'a Path,
}

impl MapContext<'_> {
    fn is_windows(&self) -> bool {
        self.resolver.platform().is_windows()
    }

    fn native(&self, path: &str) -> String {
        let absolute = absolutize_from(self.base_dir, Path::new(path));
        let absolute = absolute.to_string_lossy();
        if self.is_windows() {
            normalize_separators(&absolute)
        } else {
            absolute.into_owned()
        }
    }
}

pub fn map_path(ctx: &MapContext<'_>, path: &str) -> ShellResult<String> {
    let mapped = match &ctx.profile.path_mapping {
        PathMapping::Native => ctx.native(path),
        PathMapping::DotSource => dot_source(path),
        PathMapping::DotSourceResolved => dot_source(&ctx.native(path)),
        PathMapping::CrossEnvironment => {
            let native = ctx.native(path);
            if ctx.is_windows() {
                let exe = ctx.resolver.resolve(ctx.profile).ok();
                cross_environment(&native, exe.as_deref())
            } else {
                native
            }
        }
        PathMapping::Custom(mapper) => mapper.map(ctx, path)?,
    };
    Ok(mapped)
}

/// Same as [`map_path`], awaiting the resolver where one is consulted.
pub async fn map_path_async(ctx: &MapContext<'_>, path: &str) -> ShellResult<String> {
    let mapped = match &ctx.profile.path_mapping {
        PathMapping::CrossEnvironment if ctx.is_windows() => {
            let native = ctx.native(path);
            let exe = ctx.resolver.resolve_async(ctx.profile).await.ok();
            cross_environment(&native, exe.as_deref())
        }
        PathMapping::Custom(mapper) => mapper.map_async(ctx, path).await?,
        _ => map_path(ctx, path)?,
    };
    Ok(mapped)
}

/// `. <path>` as one token. Paths with whitespace are single-quoted so the
/// sourcing command still sees one argument.
pub fn dot_source(path: &str) -> String {
    if path.chars().any(char::is_whitespace) {
        format!(". '{}'", path.replace('\'', "''"))
    } else {
        format!(". {}", path)
    }
}

/// Rewrites a native path into the WSL mount namespace when `exe` is the
/// system `bash.exe`. Git-for-Windows and MSYS builds take native paths.
///
/// A missing `exe` leaves the path untouched; the launcher reports the
/// resolution failure.
pub fn cross_environment(native: &str, exe: Option<&Path>) -> String {
    match exe {
        Some(exe) if is_system_bash(exe) => to_mount_path(native),
        _ => native.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyshell_common::Platform;
    use std::path::PathBuf;

    fn base() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\work")
        } else {
            PathBuf::from("/work")
        }
    }

    #[test]
    fn dot_source_prefixes_and_quotes() {
        assert_eq!(dot_source("/tmp/a.ps1"), ". /tmp/a.ps1");
        assert_eq!(
            dot_source("C:/Users/Ada Lovelace/a.ps1"),
            ". 'C:/Users/Ada Lovelace/a.ps1'"
        );
        assert_eq!(dot_source("/tmp/it's here.ps1"), ". '/tmp/it''s here.ps1'");
    }

    #[test]
    fn cross_environment_only_for_system_bash() {
        let native = "C:/Users/ada/AppData/Local/Temp/polyshell_scripts1.sh";
        assert_eq!(
            cross_environment(native, Some(Path::new(r"C:\Windows\System32\bash.exe"))),
            "/mnt/c/Users/ada/AppData/Local/Temp/polyshell_scripts1.sh"
        );
        assert_eq!(
            cross_environment(native, Some(Path::new(r"C:\Program Files\Git\bin\bash.exe"))),
            native
        );
        assert_eq!(cross_environment(native, None), native);
    }

    #[test]
    fn native_mapping_is_absolute() {
        let profile = InterpreterProfile::new("sh", ".sh");
        let resolver = ExecutableResolver::new();
        let base = base();
        let ctx = MapContext {
            profile: &profile,
            resolver: &resolver,
            base_dir: &base,
        };

        let mapped = map_path(&ctx, "scripts/../hello.sh").unwrap();
        let expected = normalize_separators(&base.join("hello.sh").to_string_lossy());
        if cfg!(windows) {
            assert_eq!(mapped, expected);
        } else {
            assert_eq!(mapped, "/work/hello.sh");
        }
    }

    #[test]
    fn dot_source_keeps_path_verbatim() {
        let profile =
            InterpreterProfile::new("powershell", ".ps1").with_path_mapping(PathMapping::DotSource);
        let resolver = ExecutableResolver::new();
        let base = base();
        let ctx = MapContext {
            profile: &profile,
            resolver: &resolver,
            base_dir: &base,
        };
        assert_eq!(map_path(&ctx, "rel/x.ps1").unwrap(), ". rel/x.ps1");
    }

    #[cfg(unix)]
    #[test]
    fn cross_environment_is_native_off_windows() {
        let profile = InterpreterProfile::new("polyshell-no-such-bash", ".sh")
            .with_path_mapping(PathMapping::CrossEnvironment);
        let resolver = ExecutableResolver::for_platform(Platform::Linux);
        let base = base();
        let ctx = MapContext {
            profile: &profile,
            resolver: &resolver,
            base_dir: &base,
        };
        assert_eq!(map_path(&ctx, "x.sh").unwrap(), "/work/x.sh");
        assert!(resolver.cached("polyshell-no-such-bash").is_none());
    }

    #[tokio::test]
    async fn async_matches_sync_for_static_strategies() {
        let resolver = ExecutableResolver::new();
        let base = base();
        for mapping in [
            PathMapping::Native,
            PathMapping::DotSource,
            PathMapping::DotSourceResolved,
        ] {
            let profile = InterpreterProfile::new("x", ".x").with_path_mapping(mapping);
            let ctx = MapContext {
                profile: &profile,
                resolver: &resolver,
                base_dir: &base,
            };
            assert_eq!(
                map_path(&ctx, "a/b.x").unwrap(),
                map_path_async(&ctx, "a/b.x").await.unwrap()
            );
        }
    }
}
