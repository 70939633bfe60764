use std::{
    env, io,
    path::{Path, PathBuf},
    process::Stdio,
};

use log::debug;
use tokio::{io::AsyncWriteExt, process::Command};
use worker::JobSpec;

use super::Executor;
use crate::error::OrchestratorError;

/// The stderr lines kept when a worker process fails.
const STDERR_TAIL: usize = 20;

/// Runs every job in its own `worker` process.
///
/// The job is written as json to the child's stdin, and the child answers with the path of its
/// table on stdout. Children are killed when their job is dropped.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
}

impl ProcessExecutor {
    /// Creates a new `ProcessExecutor`.
    ///
    /// # Arguments
    /// * `program` - The worker executable.
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Creates a `ProcessExecutor` for the `worker` binary installed next to the current one.
    pub fn sibling() -> io::Result<Self> {
        let exe = env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| io::Error::other("the current executable has no parent directory"))?;

        Ok(Self::new(
            dir.join(format!("worker{}", env::consts::EXE_SUFFIX)),
        ))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Executor for ProcessExecutor {
    async fn execute(&self, job: JobSpec) -> Result<PathBuf, OrchestratorError> {
        let input = serde_json::to_vec(&job)?;
        debug!(job = job.output_id.as_str(); "spawning {}", self.program.display());

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("the worker's stdin wasn't captured"))?;

        // The child reads while it is being fed, stdin is closed once the job is written.
        let feed = async move { stdin.write_all(&input).await };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(OrchestratorError::WorkerProcess {
                status: output.status.to_string(),
                stderr: tail(&output.stderr, STDERR_TAIL),
            });
        }
        fed?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| OrchestratorError::WorkerProcess {
                status: "reported no table".into(),
                stderr: tail(&output.stderr, STDERR_TAIL),
            })?;

        Ok(PathBuf::from(path))
    }
}

/// The last `n` lines of a process' output.
fn tail(output: &[u8], n: usize) -> String {
    let text = String::from_utf8_lossy(output);
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
