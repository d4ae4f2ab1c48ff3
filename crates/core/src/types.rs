use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with a child's output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    /// Share the caller's stream.
    #[default]
    Inherit,
    /// Capture into the result's line buffers.
    Piped,
    Null,
}

impl StdioMode {
    pub fn to_stdio(self) -> Stdio {
        match self {
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Piped => Stdio::piped(),
            StdioMode::Null => Stdio::null(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdinMode {
    #[default]
    Inherit,
    Null,
}

impl StdinMode {
    pub fn to_stdio(self) -> Stdio {
        match self {
            StdinMode::Inherit => Stdio::inherit(),
            StdinMode::Null => Stdio::null(),
        }
    }
}

/// Per-call settings for `run`/`exec`.
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    /// Appended after the mapped script path.
    pub args: Vec<String>,
    pub stdin: StdinMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
    pub cwd: Option<PathBuf>,
    /// Added to (or overriding) the inherited environment.
    pub env: HashMap<String, String>,
    /// Kill the child and fail with `TimedOut` after this long.
    pub timeout: Option<Duration>,
    /// Leave the materialized script on disk after `exec` returns.
    pub keep_script: bool,
}

impl InvocationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures both stdout and stderr.
    pub fn piped() -> Self {
        Self {
            stdout: StdioMode::Piped,
            stderr: StdioMode::Piped,
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr = mode;
        self
    }

    pub fn stdin(mut self, mode: StdinMode) -> Self {
        self.stdin = mode;
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn keep_script(mut self, keep: bool) -> Self {
        self.keep_script = keep;
        self
    }
}

/// Outcome of a finished process. A non-zero `code` is a normal result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Exit code, or `-1` when the process was terminated by a signal.
    pub code: i32,
    pub signal: Option<i32>,
    /// Empty unless stdout was [`StdioMode::Piped`].
    pub stdout_lines: Vec<String>,
    /// Empty unless stderr was [`StdioMode::Piped`].
    pub stderr_lines: Vec<String>,
}

impl InvocationResult {
    pub fn from_output(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code().unwrap_or(-1),
            signal,
            stdout_lines: split_lines(stdout),
            stderr_lines: split_lines(stderr),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0 && self.signal.is_none()
    }
}

/// Splits captured bytes into lines, dropping `\r` terminators and the empty
/// tail after a final newline.
pub fn split_lines(bytes: &[u8]) -> Vec<String> {
    if bytes.is_empty() {
        return Vec::new();
    }
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_handles_crlf_and_trailing_newline() {
        assert_eq!(split_lines(b"hello world\r\nnext\n"), ["hello world", "next"]);
        assert_eq!(split_lines(b"no newline"), ["no newline"]);
        assert!(split_lines(b"").is_empty());
        assert_eq!(split_lines(b"\n"), [""]);
    }

    #[test]
    fn builder_accumulates() {
        let opts = InvocationOptions::piped()
            .arg("one")
            .args(["two", "three"])
            .env("MSG", "hello world")
            .timeout(Duration::from_secs(5));
        assert_eq!(opts.args, ["one", "two", "three"]);
        assert_eq!(opts.stdout, StdioMode::Piped);
        assert_eq!(opts.stderr, StdioMode::Piped);
        assert_eq!(opts.env.get("MSG").map(String::as_str), Some("hello world"));
        assert!(!opts.keep_script);
    }
}
