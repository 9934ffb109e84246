//! Wire protocol spoken with the external compiler.
//!
//! # Request
//!
//! The compiler reads its whole input from stdin:
//!
//! ```text
//! <mode> <color>\n<source text...>
//! ```
//!
//! `mode` is the decimal [`OutputMode`] discriminant and `color` is `1` or `0`.
//! The source follows unmodified; end of input is signalled by closing stdin.
//!
//! # Response
//!
//! A successful exit means stdout holds the result. Any other exit means
//! stderr holds the diagnostic.

use std::fmt;
use std::process::ExitStatus;
use std::str::FromStr;
use std::time::Duration;

/// Which representation the compiler should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputMode {
    /// Token sequence from the lexer.
    #[default]
    LexerTokens = 0,
    /// Syntax tree from the parser.
    SyntaxTree = 1,
    /// Generated C code.
    GeneratedCode = 2,
}

impl OutputMode {
    /// Numeric value written on the request header line.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OutputMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::LexerTokens),
            1 => Ok(Self::SyntaxTree),
            2 => Ok(Self::GeneratedCode),
            other => Err(format!("unknown output mode {} (expected 0, 1 or 2)", other)),
        }
    }
}

impl From<OutputMode> for u8 {
    fn from(mode: OutputMode) -> Self {
        mode.as_u8()
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("unknown output mode {:?} (expected 0, 1 or 2)", s))?;
        Self::try_from(value)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// One compilation request, consumed by a single bridge invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationRequest {
    pub mode: OutputMode,
    /// Ask the compiler for ANSI-colored output.
    pub color_enabled: bool,
    /// Source text, passed through byte for byte.
    pub source: Vec<u8>,
}

impl CompilationRequest {
    pub fn new(mode: OutputMode, color_enabled: bool, source: impl Into<Vec<u8>>) -> Self {
        Self {
            mode,
            color_enabled,
            source: source.into(),
        }
    }
}

/// Result of one compiler invocation.
///
/// Compiler streams are kept as raw bytes; nothing here assumes UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationOutcome {
    /// The compiler exited successfully; its stdout verbatim.
    Success { output: Vec<u8> },
    /// The compiler ran and reported failure; its stderr verbatim.
    CompileError { diagnostic: Vec<u8> },
    /// The compiler could not be started or talked to.
    LaunchError { message: String },
    /// The compiler did not finish in time and was killed.
    TimedOut { after: Duration },
}

impl CompilationOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The single payload carried by the outcome, whatever its kind.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::Success { output } => output.clone(),
            Self::CompileError { diagnostic } => diagnostic.clone(),
            Self::LaunchError { message } => message.clone().into_bytes(),
            Self::TimedOut { after } => {
                format!("compiler timed out after {:.1}s", after.as_secs_f64()).into_bytes()
            }
        }
    }

    /// Consume the outcome, returning the success flag and payload.
    pub fn into_parts(self) -> (bool, Vec<u8>) {
        let succeeded = self.succeeded();
        let payload = match self {
            Self::Success { output } => output,
            Self::CompileError { diagnostic } => diagnostic,
            Self::LaunchError { message } => message.into_bytes(),
            timed_out @ Self::TimedOut { .. } => timed_out.payload(),
        };
        (succeeded, payload)
    }
}

/// Encode a request into the bytes written to the compiler's stdin.
pub fn encode(request: &CompilationRequest) -> Vec<u8> {
    let header = format!(
        "{} {}\n",
        request.mode.as_u8(),
        u8::from(request.color_enabled)
    );
    let mut bytes = Vec::with_capacity(header.len() + request.source.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(&request.source);
    bytes
}

/// Classify a finished compiler run.
///
/// Only one stream survives: stdout on success, stderr otherwise.
pub fn classify(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> CompilationOutcome {
    if status.success() {
        CompilationOutcome::Success {
            output: stdout.to_vec(),
        }
    } else {
        CompilationOutcome::CompileError {
            diagnostic: stderr.to_vec(),
        }
    }
}
