//! Process launch seam.
//!
//! [`SystemLauncher`] resolves the interpreter binary and spawns it with
//! `std::process` (blocking) or `tokio::process` (non-blocking). Tests and
//! embedders can substitute any [`ProcessLauncher`].

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Output};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ShellError, ShellResult};
use crate::profile::InterpreterProfile;
use crate::resolver::ExecutableResolver;
use crate::types::{InvocationOptions, InvocationResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything needed to start one interpreter process.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// Executable identity; the launcher resolves it.
    pub profile: &'a InterpreterProfile,
    /// Complete argument vector (prefix args, mapped path, extra args).
    pub args: &'a [String],
    pub options: &'a InvocationOptions,
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, request: &LaunchRequest<'_>) -> ShellResult<InvocationResult>;

    async fn launch_async(&self, request: &LaunchRequest<'_>) -> ShellResult<InvocationResult>;
}

#[derive(Debug, Clone)]
pub struct SystemLauncher {
    resolver: Arc<ExecutableResolver>,
}

impl SystemLauncher {
    pub fn new(resolver: Arc<ExecutableResolver>) -> Self {
        Self { resolver }
    }

    fn command(&self, exe: &Path, request: &LaunchRequest<'_>) -> Command {
        let options = request.options;
        let mut cmd = Command::new(exe);
        cmd.args(request.args)
            .envs(&options.env)
            .stdin(options.stdin.to_stdio())
            .stdout(options.stdout.to_stdio())
            .stderr(options.stderr.to_stdio());
        if let Some(dir) = &options.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn launch_error(name: &str, source: io::Error) -> ShellError {
        ShellError::Launch {
            name: name.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    fn launch(&self, request: &LaunchRequest<'_>) -> ShellResult<InvocationResult> {
        let name = request.profile.name.as_str();
        let exe = self.resolver.resolve(request.profile)?;

        info!(
            target: "polyshell",
            "launch | interpreter={} exe={} args={:?}",
            name,
            exe.display(),
            request.args
        );
        let start = Instant::now();
        let child = self
            .command(&exe, request)
            .spawn()
            .map_err(|err| Self::launch_error(name, err))?;

        let output = match request.options.timeout {
            None => child
                .wait_with_output()
                .map_err(|err| Self::launch_error(name, err))?,
            Some(timeout) => wait_with_deadline(child, timeout, name)?,
        };

        let result = InvocationResult::from_output(output.status, &output.stdout, &output.stderr);
        info!(
            target: "polyshell",
            "completed | interpreter={} exit_code={} signal={:?} duration_ms={}",
            name,
            result.code,
            result.signal,
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    async fn launch_async(&self, request: &LaunchRequest<'_>) -> ShellResult<InvocationResult> {
        let name = request.profile.name.as_str();
        let exe = self.resolver.resolve_async(request.profile).await?;

        info!(
            target: "polyshell",
            "launch | interpreter={} exe={} args={:?}",
            name,
            exe.display(),
            request.args
        );
        let start = Instant::now();
        let mut cmd = tokio::process::Command::from(self.command(&exe, request));
        // Dropping the future (cancellation or timeout) must not orphan the child.
        cmd.kill_on_drop(true);
        let child = cmd.spawn().map_err(|err| Self::launch_error(name, err))?;

        let waited = match request.options.timeout {
            None => child.wait_with_output().await,
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(target: "polyshell", "timeout | interpreter={} after={:?}", name, timeout);
                    return Err(ShellError::TimedOut {
                        name: name.to_string(),
                        timeout,
                    });
                }
            },
        };
        let output = waited.map_err(|err| Self::launch_error(name, err))?;

        let result = InvocationResult::from_output(output.status, &output.stdout, &output.stderr);
        info!(
            target: "polyshell",
            "completed | interpreter={} exit_code={} signal={:?} duration_ms={}",
            name,
            result.code,
            result.signal,
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

type ReaderHandle = thread::JoinHandle<io::Result<Vec<u8>>>;

fn spawn_reader<R>(stream: Option<R>) -> Option<ReaderHandle>
where
    R: Read + Send + 'static,
{
    stream.map(|mut handle| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            handle.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn join_reader(handle: Option<ReaderHandle>, stream: &str) -> io::Result<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| io::Error::other(format!("{stream} reader thread panicked")))?,
        None => Ok(Vec::new()),
    }
}

/// Polls `child` until it exits or `timeout` elapses, draining piped output
/// on background threads so a full pipe cannot stall the child.
fn wait_with_deadline(mut child: Child, timeout: Duration, name: &str) -> ShellResult<Output> {
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());
    let start = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!(target: "polyshell", "timeout | interpreter={} after={:?}", name, timeout);
                    return Err(ShellError::TimedOut {
                        name: name.to_string(),
                        timeout,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                let _ = child.kill();
                return Err(SystemLauncher::launch_error(name, err));
            }
        }
    };
    debug!(target: "polyshell", interpreter = %name, "process exited, joining readers");

    let stdout = join_reader(stdout, "stdout").map_err(|err| SystemLauncher::launch_error(name, err))?;
    let stderr = join_reader(stderr, "stderr").map_err(|err| SystemLauncher::launch_error(name, err))?;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}
