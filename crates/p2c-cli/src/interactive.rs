//! Cli command implementation for p2c.
//!
//! Reads source code from stdin line by line and logs the compiler's answer.

use p2c_core::{CompilationRequest, OutputMode, ProcessBridge};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Read stdin up to the terminator line, compile it and log the result.
pub async fn execute(bridge: &ProcessBridge, mode: OutputMode, terminator: &str) {
    tracing::info!(
        "Enter content line by line. Type '{}' on a single line to finish:",
        terminator
    );

    let source = capture_until(BufReader::new(tokio::io::stdin()), terminator).await;
    compile_and_log(bridge, mode, source).await;
}

/// Collect lines until one equals `terminator` exactly.
///
/// Lines are raw bytes; a trailing `\r` is dropped along with the `\n`. The
/// terminator is dropped and the remaining lines are joined with `\n`. End
/// of input stops collection the same way; a read error is logged and
/// whatever was read so far is kept.
pub async fn capture_until<R>(mut reader: R, terminator: &str) -> Vec<u8>
where
    R: AsyncBufRead + Unpin,
{
    let mut collected: Vec<Vec<u8>> = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let content = strip_line_ending(&line);
                if content == terminator.as_bytes() {
                    break;
                }
                collected.push(content.to_vec());
            }
            Err(e) => {
                tracing::error!("error reading input: {}", e);
                break;
            }
        }
    }

    collected.join(&b'\n')
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

async fn compile_and_log(bridge: &ProcessBridge, mode: OutputMode, source: Vec<u8>) {
    // Terminal sessions ask for colored output.
    let outcome = bridge
        .run(CompilationRequest::new(mode, true, source))
        .await;

    // Log lines are text, so only the display is lossy.
    let (succeeded, payload) = outcome.into_parts();
    let payload = String::from_utf8_lossy(&payload);
    if succeeded {
        tracing::info!("Compilation successful.");
        tracing::info!("Output:\n{}", payload);
    } else {
        tracing::info!("Compilation failed.");
        tracing::info!("Error message:\n{}", payload);
    }
}
