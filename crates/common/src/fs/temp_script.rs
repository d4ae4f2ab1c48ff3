use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use tracing::trace;

/// Permission bits applied to materialized scripts (`rwxrwxrwx`).
pub const EXECUTABLE_MODE: u32 = 0o777;

/// Creates an empty, uniquely named file in the system temp directory.
///
/// The returned [`TempPath`] deletes the file on drop; call
/// [`TempPath::keep`] to persist it.
pub fn create_temp_file(prefix: &str, suffix: &str) -> io::Result<TempPath> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile()?;
    let path = file.into_temp_path();
    trace!(path = %path.display(), "created temp file");
    Ok(path)
}

pub fn write_text(path: &Path, content: &str) -> io::Result<()> {
    fs::write(path, content)
}

pub async fn write_text_async(path: &Path, content: &str) -> io::Result<()> {
    tokio::fs::write(path, content).await
}

/// Marks `path` executable by owner, group and other. No-op off Unix.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
pub async fn set_executable_async(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE)).await
}

#[cfg(not(unix))]
pub async fn set_executable_async(_path: &Path) -> io::Result<()> {
    Ok(())
}
