use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `true` when compiled for Windows.
pub const IS_WINDOWS: bool = cfg!(windows);

/// Operating system family used to select executable candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Darwin,
    FreeBsd,
    Other,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Maps a `std::env::consts::OS` value onto a platform.
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "linux" | "android" => Platform::Linux,
            "macos" | "ios" => Platform::Darwin,
            "freebsd" => Platform::FreeBsd,
            _ => Platform::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::FreeBsd => "freebsd",
            Platform::Other => "other",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Platform whose candidates are tried when this one declares none.
    ///
    /// Unix flavours share most install locations with Linux.
    pub fn fallback(&self) -> Option<Platform> {
        match self {
            Platform::Darwin | Platform::FreeBsd => Some(Platform::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "darwin" | "macos" => Ok(Platform::Darwin),
            "freebsd" => Ok(Platform::FreeBsd),
            "other" => Ok(Platform::Other),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}
