//! File command implementation for p2c.
//!
//! Compiles one input file and writes whatever the compiler answered, result
//! or diagnostic, to the output file. Both files are handled as raw bytes.

use std::path::Path;

use anyhow::Context;
use p2c_core::{CompilationRequest, OutputMode, ProcessBridge};

/// Compile `input` and write the payload to `output`.
///
/// Reading the input or writing the output are the only failures; a
/// compiler error still produces an output file.
pub async fn execute(
    bridge: &ProcessBridge,
    mode: OutputMode,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let source = tokio::fs::read(input)
        .await
        .with_context(|| format!("error reading file {}", input.display()))?;

    let outcome = bridge
        .run(CompilationRequest::new(mode, false, source))
        .await;
    let (succeeded, payload) = outcome.into_parts();

    tokio::fs::write(output, payload)
        .await
        .with_context(|| format!("error writing to file {}", output.display()))?;

    if succeeded {
        tracing::info!("File written successfully in: {}", output.display());
    } else {
        tracing::info!("Compile error. Message written in: {}", output.display());
    }

    Ok(())
}
