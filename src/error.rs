use thiserror::Error;

/// Errors produced while validating input, obtaining a quote or computing a markup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarkupError {
    /// Malformed or out-of-range user input. Never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The rate source had no usable rate for the pair.
    #[error("Exchange rate unavailable: {0}")]
    QuoteUnavailable(String),

    /// Arithmetic failed after validation passed.
    #[error("Computation failed: {0}")]
    Computation(String),

    /// A calculation is already in flight.
    #[error("A calculation is already in progress")]
    Busy,
}

impl MarkupError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarkupError::Validation(message.into())
    }

    pub fn quote_unavailable(message: impl Into<String>) -> Self {
        MarkupError::QuoteUnavailable(message.into())
    }

    /// Builds a `Computation` error and logs it, since reaching it means
    /// validation let something through.
    pub fn computation(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("markup computation contract violated: {}", message);
        MarkupError::Computation(message)
    }
}
