use thiserror::Error;

/// Result-extraction failures.
///
/// The `Display` text is the exact string surfaced into the calling cell, so
/// each variant renders distinctly and with the `Error:` prefix the display
/// layer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Error: No result field in response")]
    MissingResultField,
    #[error("Error: Empty result field in response")]
    EmptyResultField,
    #[error("Error: Unterminated result value in response")]
    UnterminatedValue,
    #[error("Error: Unterminated string result in response")]
    UnterminatedString,
}

/// Failures reported by the external invoker.
///
/// Rendered as cell text at the call boundary: transport problems use the
/// `Error:` prefix, HTTP-level failures surface the response body under
/// `API Error:` so the model's own diagnostics reach the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    #[error("Error: {message}")]
    Transport { message: String },
    #[error("API Error: {body}")]
    Http { status: u16, body: String },
}
