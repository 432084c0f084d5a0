//! OS-specific argv construction.
//!
//! The host family is detected once and mapped to a [`CommandStrategy`]
//! through [`strategy_for`]; nothing else in the pipeline branches on the OS.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const POSIX_ELEVATION_TOKEN: &str = "sudo";
pub const WINDOWS_ELEVATION_TOKEN: &str = "runas /user:administrator";

const POSIX_SHELL: &str = "sh";
const WINDOWS_INTERPRETER: [&str; 2] = ["cmd.exe", "/c"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Posix,
    Windows,
}

impl OsFamily {
    pub fn detect() -> Self {
        if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Posix
        }
    }

    pub fn elevation_token(self) -> &'static str {
        match self {
            OsFamily::Posix => POSIX_ELEVATION_TOKEN,
            OsFamily::Windows => WINDOWS_ELEVATION_TOKEN,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Posix => f.write_str("posix"),
            OsFamily::Windows => f.write_str("windows"),
        }
    }
}

/// Final argument vector for one request. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    argv: Vec<String>,
    elevated: bool,
}

impl ResolvedCommand {
    fn new(argv: Vec<String>, elevated: bool) -> Self {
        debug_assert!(!argv.is_empty());
        Self { argv, elevated }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn elevated(&self) -> bool {
        self.elevated
    }
}

impl fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Builds the argv for a resolved binary, wrapping it for elevation when requested.
pub trait CommandStrategy: Send + Sync + fmt::Debug {
    fn family(&self) -> OsFamily;

    fn build(&self, program: &Path, arguments: &[String], elevated: bool) -> ResolvedCommand;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PosixCommandStrategy;

impl CommandStrategy for PosixCommandStrategy {
    fn family(&self) -> OsFamily {
        OsFamily::Posix
    }

    fn build(&self, program: &Path, arguments: &[String], elevated: bool) -> ResolvedCommand {
        let mut argv = Vec::with_capacity(arguments.len() + 3);
        if elevated {
            argv.push(POSIX_ELEVATION_TOKEN.to_string());
            argv.push(POSIX_SHELL.to_string());
        }
        argv.push(program.to_string_lossy().into_owned());
        argv.extend(arguments.iter().cloned());

        let command = ResolvedCommand::new(argv, elevated);
        info!(command = %command, elevated, "start running");
        command
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsCommandStrategy;

impl CommandStrategy for WindowsCommandStrategy {
    fn family(&self) -> OsFamily {
        OsFamily::Windows
    }

    fn build(&self, program: &Path, arguments: &[String], elevated: bool) -> ResolvedCommand {
        let mut argv = Vec::with_capacity(arguments.len() + 5);
        if elevated {
            argv.extend(WINDOWS_INTERPRETER.iter().map(|s| s.to_string()));
            argv.extend(
                WINDOWS_ELEVATION_TOKEN
                    .split_whitespace()
                    .map(|s| s.to_string()),
            );
        }
        argv.push(program.to_string_lossy().into_owned());
        argv.extend(arguments.iter().cloned());

        let command = ResolvedCommand::new(argv, elevated);
        info!(command = %command, elevated, "start running");
        command
    }
}

/// Pick the command strategy for an OS family.
pub fn strategy_for(family: OsFamily) -> Arc<dyn CommandStrategy> {
    info!(os = %family, "selected command strategy");
    match family {
        OsFamily::Posix => Arc::new(PosixCommandStrategy),
        OsFamily::Windows => Arc::new(WindowsCommandStrategy),
    }
}
