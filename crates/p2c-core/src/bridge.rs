//! Process bridge to the external compiler.
//!
//! Every invocation spawns a fresh compiler process, feeds it the encoded
//! request on stdin, drains stdout and stderr while waiting for it to exit,
//! and classifies the result. Nothing is pooled or reused between calls.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::GatewayConfig;
use crate::protocol::{self, CompilationOutcome, CompilationRequest};

/// Runs the external compiler, one child process per request.
///
/// Cloning is cheap; clones share the admission limit.
#[derive(Debug, Clone)]
pub struct ProcessBridge {
    inner: Arc<BridgeInner>,
}

#[derive(Debug)]
struct BridgeInner {
    /// Resolved compiler executable.
    program: PathBuf,
    /// Upper bound on one run.
    compile_timeout: Option<Duration>,
    /// Caps the number of live compiler children.
    permits: Semaphore,
}

impl ProcessBridge {
    /// Create a bridge from the gateway configuration.
    pub fn new(config: &GatewayConfig) -> Self {
        let program = resolve_program(&config.compiler);
        tracing::debug!(
            "Compiler executable resolved to {} (configured as {:?})",
            program.display(),
            config.compiler
        );

        Self {
            inner: Arc::new(BridgeInner {
                program,
                compile_timeout: config.compile_timeout,
                permits: Semaphore::new(config.max_concurrent_compiles.max(1)),
            }),
        }
    }

    /// Path of the compiler executable this bridge runs.
    pub fn program(&self) -> &Path {
        &self.inner.program
    }

    /// Number of compiler runs that may start right now without waiting.
    pub fn available_permits(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Run the compiler on one request.
    pub async fn run(&self, request: CompilationRequest) -> CompilationOutcome {
        // The semaphore is never closed.
        let Ok(_permit) = self.inner.permits.acquire().await else {
            return CompilationOutcome::LaunchError {
                message: "compiler admission closed".to_string(),
            };
        };

        tracing::info!("Compiling using command {} ...", self.inner.program.display());

        let input = protocol::encode(&request);
        match self.inner.compile_timeout {
            Some(limit) => match timeout(limit, self.spawn_and_collect(input)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    // Dropping the future dropped the child, which kills it.
                    tracing::warn!("Compiler did not finish within {:?}, killed", limit);
                    CompilationOutcome::TimedOut { after: limit }
                }
            },
            None => self.spawn_and_collect(input).await,
        }
    }

    async fn spawn_and_collect(&self, input: Vec<u8>) -> CompilationOutcome {
        let mut child = match Command::new(&self.inner.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    "Failed to start compiler {}: {}",
                    self.inner.program.display(),
                    e
                );
                return CompilationOutcome::LaunchError {
                    message: e.to_string(),
                };
            }
        };

        // Write stdin on its own task so a child that fills its output pipes
        // before consuming all input cannot stall us.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!("Compiler closed stdin early: {}", e);
                    return;
                }
                if let Err(e) = stdin.shutdown().await {
                    tracing::debug!("Failed to close compiler stdin: {}", e);
                }
            })
        });

        let output = child.wait_with_output().await;

        if let Some(writer) = writer {
            if let Err(e) = writer.await {
                tracing::error!("Compiler stdin task failed: {}", e);
            }
        }

        match output {
            Ok(output) => {
                let outcome = protocol::classify(output.status, &output.stdout, &output.stderr);
                tracing::debug!(
                    "Compiler exited with {} ({} bytes stdout, {} bytes stderr)",
                    output.status,
                    output.stdout.len(),
                    output.stderr.len()
                );
                outcome
            }
            Err(e) => {
                tracing::error!("Failed to collect compiler output: {}", e);
                CompilationOutcome::LaunchError {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Resolve the configured compiler name to an executable path.
///
/// Names containing a path separator are taken as given. Bare names prefer
/// the working directory, then `PATH`. When nothing matches, the
/// working-directory path is returned so the spawn error names it.
fn resolve_program(name: &str) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return candidate.to_path_buf();
    }

    let local = Path::new(".").join(name);
    if local.is_file() {
        return local;
    }

    which::which(name).unwrap_or(local)
}
