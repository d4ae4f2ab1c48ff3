// # -----------------------------
// # crates/cli/src/main.rs
// # -----------------------------
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use polyshell_core::{
    ErrorKind, InvocationOptions, InvocationResult, ShellError, Shells, ShellsConfig, StdioMode,
};
use tracing_subscriber::{fmt, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status for failures that never reached a child process.
const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_EXECUTABLE: i32 = 126;
const EXIT_NOT_FOUND: i32 = 127;

#[derive(Parser, Debug)]
#[command(name = "polyshell", version = VERSION, about = "Run scripts through any registered interpreter", long_about = None)]
struct Cli {
    /// Profile configuration file (defaults to POLYSHELL_CONFIG, then ./polyshell.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error, off). Overrides RUST_LOG if set.
    #[arg(long = "log-level", global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered interpreters
    List,
    /// Print the binary an interpreter resolves to
    Which { name: String },
    /// Print the argument vector `run` would launch, one token per line
    Show {
        name: String,
        file: PathBuf,
        /// Extra arguments passed to the script
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// Run an existing script file
    Run {
        name: String,
        file: PathBuf,
        #[command(flatten)]
        launch: LaunchArgs,
    },
    /// Run inline script text (`-` reads it from stdin)
    Exec {
        name: String,
        script: String,
        /// Leave the temporary script on disk (its path is logged at debug level)
        #[arg(long)]
        keep_script: bool,
        #[command(flatten)]
        launch: LaunchArgs,
    },
}

#[derive(Args, Debug)]
struct LaunchArgs {
    /// Working directory of the interpreter process
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,
    /// Extra environment variable, repeatable
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env)]
    env: Vec<(String, String)>,
    /// Kill the interpreter after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Capture output and re-emit it line by line after the process exits
    #[arg(long)]
    capture: bool,
    /// Extra arguments passed to the script
    #[arg(last = true)]
    args: Vec<String>,
}

impl LaunchArgs {
    fn options(&self) -> InvocationOptions {
        let mut options = InvocationOptions::new().args(self.args.iter().cloned());
        if let Some(dir) = &self.cwd {
            options = options.cwd(dir);
        }
        for (key, value) in &self.env {
            options = options.env(key, value);
        }
        if let Some(secs) = self.timeout {
            options = options.timeout(Duration::from_secs(secs));
        }
        if self.capture {
            options = options
                .stdout(StdioMode::Piped)
                .stderr(StdioMode::Piped);
        }
        options
    }
}

fn parse_env(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn init_logging(log_level: Option<&str>) -> Result<()> {
    // CLI arg overrides RUST_LOG
    let filter = if let Some(level) = log_level {
        match level.to_lowercase().as_str() {
            "off" => EnvFilter::new("off"),
            "error" => EnvFilter::new("error"),
            "warn" | "warning" => EnvFilter::new("warn"),
            "info" => EnvFilter::new("info"),
            "debug" => EnvFilter::new("debug"),
            "trace" => EnvFilter::new("trace"),
            _ => {
                eprintln!("Warning: Invalid log level '{}', using 'info'", level);
                EnvFilter::new("info")
            }
        }
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout belongs to the child process
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialise logging: {}", err))
}

fn load_shells(config: Option<PathBuf>) -> Result<&'static Shells> {
    let shells = polyshell_core::global();
    if let Some((path, cfg)) = ShellsConfig::from_sources(config)? {
        cfg.apply(shells);
        tracing::debug!("applied configuration from {}", path.display());
    }
    Ok(shells)
}

fn read_script(script: String) -> Result<String> {
    if script != "-" {
        return Ok(script);
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read script from stdin")?;
    Ok(buf)
}

fn emit(result: &InvocationResult) -> i32 {
    for line in &result.stdout_lines {
        println!("{}", line);
    }
    for line in &result.stderr_lines {
        eprintln!("{}", line);
    }
    match result.signal {
        Some(signal) => 128 + signal,
        None => result.code,
    }
}

async fn dispatch(cli: Cli) -> Result<i32> {
    let shells = load_shells(cli.config)?;

    match cli.command {
        Commands::List => {
            let mut names = shells.list();
            names.sort();
            for name in names {
                println!("{}", name);
            }
            Ok(0)
        }
        Commands::Which { name } => {
            let exe = shells.which_async(&name).await?;
            println!("{}", exe.display());
            Ok(0)
        }
        Commands::Show { name, file, args } => {
            let options = InvocationOptions::new().args(args);
            for token in shells.command_line(&name, &file, &options)? {
                println!("{}", token);
            }
            Ok(0)
        }
        Commands::Run { name, file, launch } => {
            let result = shells.run_async(&name, &file, &launch.options()).await?;
            Ok(emit(&result))
        }
        Commands::Exec {
            name,
            script,
            keep_script,
            launch,
        } => {
            let script = read_script(script)?;
            let options = launch.options().keep_script(keep_script);
            let result = shells.exec_async(&name, &script, &options).await?;
            Ok(emit(&result))
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ShellError>().map(ShellError::kind) {
        Some(ErrorKind::NotFound) => EXIT_NOT_FOUND,
        Some(ErrorKind::PlatformNotSupported) => EXIT_NOT_EXECUTABLE,
        _ => EXIT_FAILURE,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_level.as_deref()) {
        eprintln!("{:#}", err);
    }
    tracing::debug!("polyshell {} starting: {:?}", VERSION, cli);

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}
