//! Built-in interpreter profiles.

use polyshell_common::Platform;

use crate::profile::{InterpreterProfile, Materializer, PathMapping};
use crate::registry::Registry;

const POWERSHELL_ARGS: &[&str] = &[
    "-NoProfile",
    "-NonInteractive",
    "-ExecutionPolicy",
    "Unrestricted",
    "-Command",
];

/// Stop on the first error and surface the last native exit code.
const POWERSHELL_PREAMBLE: &str = "$ErrorActionPreference = 'Stop'";
const POWERSHELL_POSTAMBLE: &str =
    r"if ((Test-Path -LiteralPath variable:\LASTEXITCODE)) { exit $LASTEXITCODE }";

fn bash() -> InterpreterProfile {
    InterpreterProfile::new("bash", ".sh")
        .with_args(["--noprofile", "--norc", "-e", "-o", "pipefail"])
        .with_candidates(
            Platform::Windows,
            [
                r"%ProgramFiles%\Git\bin\bash.exe",
                r"%ProgramFiles%\Git\usr\bin\bash.exe",
                r"%ChocolateyInstall%\msys2\usr\bin\bash.exe",
                r"%SystemDrive%\msys64\usr\bin\bash.exe",
                r"%SystemDrive%\msys\usr\bin\bash.exe",
                r"%SystemRoot%\System32\bash.exe",
            ],
        )
        .with_path_mapping(PathMapping::CrossEnvironment)
        .with_env_override("POLYSHELL_BASH")
}

fn sh() -> InterpreterProfile {
    InterpreterProfile::new("sh", ".sh")
        .with_args(["-e"])
        .with_candidates(
            Platform::Windows,
            [
                r"%ProgramFiles%\Git\usr\bin\sh.exe",
                r"%ChocolateyInstall%\msys2\usr\bin\sh.exe",
                r"%SystemDrive%\msys64\usr\bin\sh.exe",
                r"%SystemDrive%\msys\usr\bin\sh.exe",
            ],
        )
        .with_env_override("POLYSHELL_SH")
}

fn powershell() -> InterpreterProfile {
    InterpreterProfile::new("powershell", ".ps1")
        .with_args(POWERSHELL_ARGS.iter().copied())
        .with_candidates(
            Platform::Windows,
            ["%SystemRoot%/System32/WindowsPowerShell/v1.0/powershell.exe"],
        )
        .with_path_mapping(PathMapping::DotSource)
        .with_materializer(Materializer::wrapped(
            POWERSHELL_PREAMBLE,
            POWERSHELL_POSTAMBLE,
        ))
}

fn pwsh() -> InterpreterProfile {
    InterpreterProfile::new("pwsh", ".ps1")
        .with_args(POWERSHELL_ARGS.iter().copied())
        .with_candidates(
            Platform::Windows,
            [
                "%ProgramFiles%/PowerShell/7/pwsh.exe",
                "%ProgramFiles(x86)%/PowerShell/7/pwsh.exe",
                "%ProgramFiles%/PowerShell/6/pwsh.exe",
                "%ProgramFiles(x86)%/PowerShell/6/pwsh.exe",
            ],
        )
        .with_candidates(
            Platform::Linux,
            [
                "/opt/microsoft/powershell/7/pwsh",
                "/opt/microsoft/powershell/6/pwsh",
            ],
        )
        .with_candidates(
            Platform::Darwin,
            [
                "/usr/local/microsoft/powershell/7/pwsh",
                "/opt/homebrew/bin/pwsh",
                "/usr/local/bin/pwsh",
            ],
        )
        .with_path_mapping(PathMapping::DotSourceResolved)
        .with_materializer(Materializer::wrapped(
            POWERSHELL_PREAMBLE,
            POWERSHELL_POSTAMBLE,
        ))
        .with_env_override("POLYSHELL_PWSH")
}

fn cmd() -> InterpreterProfile {
    InterpreterProfile::new("cmd", ".cmd")
        .with_args(["/D", "/E:ON", "/V:OFF", "/S", "/C", "CALL"])
        .with_candidates(Platform::Windows, ["%SystemRoot%/System32/cmd.exe"])
        .with_materializer(Materializer::wrapped("@echo off", ""))
        .restricted_to([Platform::Windows])
}

fn deno() -> InterpreterProfile {
    InterpreterProfile::new("deno", ".ts")
        .with_args(["run", "-A"])
        .with_candidates(
            Platform::Windows,
            [
                r"%UserProfile%\.deno\bin\deno.exe",
                r"%ChocolateyInstall%\lib\deno\tools\deno.exe",
            ],
        )
        .with_candidates(Platform::Linux, ["$HOME/.deno/bin/deno"])
        .with_env_override("DENO_EXE")
}

fn node() -> InterpreterProfile {
    InterpreterProfile::new("node", ".js")
        .with_candidates(
            Platform::Windows,
            [
                "%ProgramFiles%/nodejs/node.exe",
                "%ProgramFiles(x86)%/nodejs/node.exe",
            ],
        )
        .with_candidates(Platform::Linux, ["/usr/bin/node"])
}

fn python() -> InterpreterProfile {
    InterpreterProfile::new("python", ".py")
        .with_candidates(Platform::Linux, ["/usr/bin/python3", "/usr/bin/python"])
}

fn ruby() -> InterpreterProfile {
    InterpreterProfile::new("ruby", ".rb").with_candidates(Platform::Linux, ["/usr/bin/ruby"])
}

fn perl() -> InterpreterProfile {
    InterpreterProfile::new("perl", ".pl").with_candidates(Platform::Linux, ["/usr/bin/perl"])
}

fn dotnet_script() -> InterpreterProfile {
    InterpreterProfile::new("dotnet-script", ".csx")
        .with_candidates(Platform::Linux, ["${HOME}/.dotnet/tools/dotnet-script"])
        .with_candidates(
            Platform::Windows,
            [r"%UserProfile%\.dotnet\tools\dotnet-script.exe"],
        )
}

pub fn builtin_profiles() -> Vec<InterpreterProfile> {
    vec![
        bash(),
        sh(),
        powershell(),
        pwsh(),
        cmd(),
        deno(),
        node(),
        python(),
        ruby(),
        perl(),
        dotnet_script(),
    ]
}

pub fn register_builtins(registry: &Registry) {
    for profile in builtin_profiles() {
        registry.register(profile.name.clone(), profile);
    }
}
