/// Error surfaced to the binary (and to library callers) with a process exit code.
///
/// Exit codes:
/// - `2`: rejected input or configuration (bad file, invalid coverage ratios)
/// - `3`: not enough data to run the requested command at all
/// - `4`: internal or programmer error (e.g. mismatched input lengths)
#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Rejected input (exit code 2).
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Mismatched lengths and similar caller bugs (exit code 4).
    pub fn length_mismatch(what: &str, left: usize, right: usize) -> Self {
        Self::new(4, format!("{what}: length mismatch ({left} != {right})"))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}
