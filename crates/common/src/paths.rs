use path_clean::PathClean;
use std::io;
use std::path::{Path, PathBuf};

/// Rewrites every `\` to `/`.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolves `path` against `base` and cleans `.`/`..` lexically.
///
/// Absolute inputs ignore `base`. Nothing is touched on disk, so the target
/// does not need to exist.
pub fn absolutize_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        base.join(path).clean()
    }
}

/// Resolves `path` against the current working directory.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(absolutize_from(&cwd, path))
}

/// Translates a drive-letter path into the `/mnt/<drive>` namespace used by
/// the Windows Subsystem for Linux.
///
/// `C:/Users/ada/x.sh` becomes `/mnt/c/Users/ada/x.sh`. Inputs that do not
/// start with a drive letter are returned unchanged.
pub fn to_mount_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/' || bytes[2] == b'\\');
    if !has_drive {
        return path.to_string();
    }

    let drive = (bytes[0] as char).to_ascii_lowercase();
    let rest = normalize_separators(&path[2..]);
    if rest.is_empty() {
        format!("/mnt/{}", drive)
    } else {
        format!("/mnt/{}{}", drive, rest)
    }
}

/// `true` if `exe` is the `bash.exe` shipped in the Windows system directory
/// (the WSL launcher) rather than a Git-for-Windows or MSYS build.
pub fn is_system_bash(exe: &Path) -> bool {
    let normalized = normalize_separators(&exe.to_string_lossy()).to_ascii_lowercase();
    normalized.ends_with("system32/bash.exe")
}
