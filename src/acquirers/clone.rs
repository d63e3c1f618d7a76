use super::{FileListing, SourceAcquirer};
use crate::config::CloneSettings;
use crate::error::{AnalyzerError, Result};
use crate::repository::RepositoryReference;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use url::Url;

const TEMP_PREFIX: &str = "repomentor-";
const ALLOWED_PROTOCOLS: &str = "https:http";
const GROUP_EXIT_POLLS: u32 = 50;
const GROUP_EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shallow-clones a repository into a scoped temporary directory
///
/// Only `http`/`https` URLs with a host are cloned. `git` runs in its own
/// process group so a timeout kills its transport helpers along with it.
#[derive(Debug, Clone)]
pub struct CloneAcquirer {
    git_program: String,
    timeout: Duration,
    temp_root: PathBuf,
}

impl CloneAcquirer {
    /// Creates a clone acquirer from the clone settings
    pub fn new(settings: &CloneSettings) -> Self {
        Self {
            git_program: settings.git_program.clone(),
            timeout: settings.timeout,
            temp_root: settings.temp_dir.clone(),
        }
    }

    fn scoped_dir(&self) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&self.temp_root)
            .map_err(|e| {
                AnalyzerError::Internal(format!(
                    "Failed to create clone directory in {}: {}",
                    self.temp_root.display(),
                    e
                ))
            })
    }

    fn command(&self, url: &str, dest: &TempDir) -> Command {
        let mut command = Command::new(&self.git_program);
        command
            .args(["clone", "--depth", "1", "--quiet", "--"])
            .arg(url)
            .arg(dest.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_ALLOW_PROTOCOL", ALLOWED_PROTOCOLS)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

/// Rejects anything git would read as a local path or a non-network transport
fn ensure_network_url(reference: &RepositoryReference) -> Result<()> {
    match Url::parse(reference.url()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(AnalyzerError::InvalidInput(format!(
            "The clone strategy needs an http(s) repository URL, got '{}'",
            reference.url()
        ))),
    }
}

/// Kills the clone's process group and waits until no member is left running
#[cfg(unix)]
async fn terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let group = pid as libc::pid_t;

    // SAFETY: killpg takes plain integers; the group was created for this clone.
    unsafe { libc::killpg(group, libc::SIGKILL) };
    if let Err(e) = child.wait().await {
        warn!("Failed to reap git: {}", e);
    }

    for _ in 0..GROUP_EXIT_POLLS {
        // SAFETY: signal 0 only checks whether the group still exists.
        if unsafe { libc::killpg(group, 0) } != 0 {
            return;
        }
        tokio::time::sleep(GROUP_EXIT_POLL_INTERVAL).await;
    }
    warn!(pgid = group, "git helpers still present after kill");
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill git: {}", e);
    }
}

#[async_trait]
impl SourceAcquirer for CloneAcquirer {
    fn name(&self) -> &'static str {
        "clone"
    }

    async fn acquire(&self, reference: &RepositoryReference) -> Result<FileListing> {
        ensure_network_url(reference)?;

        // Dropped on every early return below, which removes the checkout.
        let root = self.scoped_dir()?;
        info!(repo = %reference, dir = %root.path().display(), "Cloning repository");

        let mut child = self.command(reference.url(), &root).spawn().map_err(|e| {
            AnalyzerError::Internal(format!("Failed to run '{}': {}", self.git_program, e))
        })?;

        let stderr = child.stderr.take();
        let stderr_reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                if let Err(e) = stderr.read_to_end(&mut buf).await {
                    debug!("Failed to read git stderr: {}", e);
                }
            }
            buf
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(repo = %reference, timeout = ?self.timeout, "Clone timed out");
                stderr_reader.abort();
                terminate(&mut child).await;
                return Err(AnalyzerError::Timeout(format!(
                    "cloning {} exceeded {:?}",
                    reference, self.timeout
                )));
            }
        };

        if !status.success() {
            let stderr = stderr_reader.await.unwrap_or_default();
            let stderr = String::from_utf8_lossy(&stderr);
            let reason = stderr
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("no error output");
            warn!(repo = %reference, %status, "Clone failed: {}", reason);
            return Err(AnalyzerError::Acquisition(format!(
                "git clone exited with {}: {}",
                status, reason
            )));
        }

        stderr_reader.abort();
        debug!(repo = %reference, "Clone finished");
        Ok(FileListing::LocalTree { root })
    }
}
