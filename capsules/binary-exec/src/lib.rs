//! Binary execution capsule.
//!
//! Runs a script or executable named by a caller: strips an elevation prefix,
//! resolves the file, builds the OS-specific argv, supervises the child under a
//! wall-clock timeout and classifies the result into a fixed taxonomy.

pub mod classification;
pub mod command;
pub mod privilege;
pub mod resolver;
pub mod supervisor;

pub use classification::{Classification, StatusCategory};
pub use command::{
    strategy_for, CommandStrategy, OsFamily, PosixCommandStrategy, ResolvedCommand,
    WindowsCommandStrategy,
};
pub use privilege::{detect_elevation, PrivilegeMode};
pub use resolver::PathResolver;
pub use supervisor::{ProcessSupervisor, SupervisedRun};

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// One inbound execution, as typed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    binary_reference: String,
    arguments: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(binary_reference: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            binary_reference: binary_reference.into(),
            arguments,
        }
    }

    pub fn binary_reference(&self) -> &str {
        &self.binary_reference
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

/// Result of a supervised execution. Output is only kept for successful runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    raw_exit_code: Option<i32>,
    output_lines: Option<Vec<String>>,
    classification: Classification,
    duration_ms: u64,
}

impl ExecutionOutcome {
    fn from_run(run: SupervisedRun, duration_ms: u64) -> Self {
        let (raw_exit_code, classification, output) = match run {
            SupervisedRun::Exited { code, output } => {
                (code, Classification::from_status_code(code), Some(output))
            }
            SupervisedRun::Failed(classification) => (None, classification, None),
            SupervisedRun::TimedOut => (None, Classification::TimeoutReached, None),
        };

        Self {
            raw_exit_code,
            output_lines: output.filter(|_| classification.is_success()),
            classification,
            duration_ms,
        }
    }

    pub fn raw_exit_code(&self) -> Option<i32> {
        self.raw_exit_code
    }

    pub fn output_lines(&self) -> Option<&[String]> {
        self.output_lines.as_deref()
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Captured output on success, the classification otherwise.
    pub fn into_result(self) -> Result<Vec<String>, Classification> {
        match self.output_lines {
            Some(lines) if self.classification.is_success() => Ok(lines),
            _ => Err(self.classification),
        }
    }
}

/// Failures that stop the pipeline before a process is spawned.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("binary file '{reference}' not found")]
    FileNotFound { reference: String },
    #[error("binary file '{}' is not executable", path.display())]
    NotExecutable { path: std::path::PathBuf },
    #[error("failed to determine working directory: {source}")]
    WorkingDirectory { source: std::io::Error },
}

impl ExecError {
    pub fn classification(&self) -> Classification {
        match self {
            ExecError::FileNotFound { .. } => Classification::FileNotFound,
            ExecError::NotExecutable { .. } => Classification::FilePermissionDenied,
            ExecError::WorkingDirectory { .. } => Classification::InternalServerError,
        }
    }
}

/// Wires the pipeline stages together. Holds no per-request state and can be
/// shared across concurrent executions.
#[derive(Debug, Clone)]
pub struct BinaryExecutor {
    strategy: Arc<dyn CommandStrategy>,
    resolver: PathResolver,
    supervisor: ProcessSupervisor,
}

impl BinaryExecutor {
    pub fn new(
        strategy: Arc<dyn CommandStrategy>,
        resolver: PathResolver,
        supervisor: ProcessSupervisor,
    ) -> Self {
        Self {
            strategy,
            resolver,
            supervisor,
        }
    }

    /// Executor for the host OS, probing the working and home directories.
    pub fn for_host(timeout: Duration) -> Self {
        Self::new(
            strategy_for(OsFamily::detect()),
            PathResolver::from_environment(),
            ProcessSupervisor::new(timeout),
        )
    }

    pub fn family(&self) -> OsFamily {
        self.strategy.family()
    }

    pub fn timeout(&self) -> Duration {
        self.supervisor.timeout()
    }

    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutcome, ExecError> {
        let span = info_span!("execution", id = %Uuid::new_v4());
        self.execute_inner(request).instrument(span).await
    }

    async fn execute_inner(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome, ExecError> {
        let mode = detect_elevation(request.binary_reference(), self.family());
        let resolved = self.resolver.resolve(&mode.path)?;
        let program = resolver::absolutize(&resolved)
            .map_err(|source| ExecError::WorkingDirectory { source })?;
        if mode.elevated && self.family() == OsFamily::Posix {
            resolver::ensure_executable(&program)?;
        }
        let command = self
            .strategy
            .build(&program, request.arguments(), mode.elevated);

        let start = Instant::now();
        let run = self.supervisor.run(&command).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(duration_ms, "command execution time is {} milliseconds", duration_ms);

        let outcome = ExecutionOutcome::from_run(run, duration_ms);
        info!(
            classification = outcome.classification().name(),
            exit_code = ?outcome.raw_exit_code(),
            "execution classified"
        );
        Ok(outcome)
    }
}
