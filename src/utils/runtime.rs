/// The sandboxed execution runtime the pipeline runs against. The trait is
/// the seam between the run controller and the process/file environment;
/// `LocalRuntime` backs the CLI with a scratch directory and `sh -c`,
/// integration tests substitute a scripted mock.

use anyhow::{Result, anyhow};
use log::debug;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::defs::{MINIMAP2_TAG, TOOL_VERSIONS, VIRAL_CONSENSUS_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub tag: &'static str,
    pub version: &'static str,
}

/// The tool identifiers and versions the runtime is initialized with.
pub fn required_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            tag: VIRAL_CONSENSUS_TAG,
            version: TOOL_VERSIONS[VIRAL_CONSENSUS_TAG],
        },
        ToolSpec {
            tag: MINIMAP2_TAG,
            version: TOOL_VERSIONS[MINIMAP2_TAG],
        },
    ]
}

#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub status: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

#[allow(async_fn_in_trait)]
pub trait SandboxRuntime {
    /// One-shot asynchronous initialization with the required tools.
    async fn init(&mut self, tools: &[ToolSpec]) -> Result<()>;

    /// True once `init` has completed. Callers poll this rather than failing
    /// when work arrives before initialization finishes.
    async fn poll_ready(&self) -> bool;

    /// Size of a workspace file, or None if it does not exist.
    async fn file_size(&self, name: &str) -> Result<Option<u64>>;

    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Idempotent: removing an absent file is not an error.
    async fn remove_file(&mut self, name: &str) -> Result<()>;

    /// Runs a rendered shell command line inside the workspace.
    async fn exec(&mut self, command: &str) -> Result<ExecOutput>;

    /// Exports a workspace file's bytes for download.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;
}

/// Runtime over a local scratch directory, spawning the native binaries.
pub struct LocalRuntime {
    workdir: PathBuf,
    ready: bool,
}

impl LocalRuntime {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        LocalRuntime {
            workdir: workdir.into(),
            ready: false,
        }
    }

    pub fn workdir(&self) -> &PathBuf {
        &self.workdir
    }

    async fn presence_check(tag: &str) -> Result<()> {
        let status = Command::new("sh")
            .arg("-c")
            .arg(format!("command -v {}", tag))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| anyhow!("Failed to spawn shell for tool check: {}", e))?;
        if !status.success() {
            return Err(anyhow!("{} not found on PATH. Is {} installed?", tag, tag));
        }
        Ok(())
    }
}

impl SandboxRuntime for LocalRuntime {
    async fn init(&mut self, tools: &[ToolSpec]) -> Result<()> {
        for tool in tools {
            Self::presence_check(tool.tag).await?;
            debug!("Found {} (expected version {})", tool.tag, tool.version);
        }
        tokio::fs::create_dir_all(&self.workdir).await?;
        self.ready = true;
        Ok(())
    }

    async fn poll_ready(&self) -> bool {
        self.ready
    }

    async fn file_size(&self, name: &str) -> Result<Option<u64>> {
        match tokio::fs::metadata(self.workdir.join(name)).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(self.workdir.join(name), bytes).await?;
        Ok(())
    }

    async fn remove_file(&mut self, name: &str) -> Result<()> {
        match tokio::fs::remove_file(self.workdir.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exec(&mut self, command: &str) -> Result<ExecOutput> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| anyhow!("Failed to spawn command: {}", e))?;
        Ok(ExecOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.workdir.join(name)).await?)
    }
}
