use std::error::Error;
use std::fmt;

/// Client-specific error types.
#[derive(Debug)]
pub enum SerasaError {
    /// Network or HTTP-client-layer failure.
    Transport(String),
    /// Error reported by the API in a structured body (`message` or `errors[]`).
    Api(String),
    /// Non-success response whose body matches no known error shape.
    /// Carries the full serialized response envelope.
    UnrecognizedResponse(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<SerasaError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for SerasaError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerasaError::Transport(msg) => write!(f, "Transport error: {}", msg),
            SerasaError::Api(msg) => write!(f, "API error: {}", msg),
            SerasaError::UnrecognizedResponse(raw) => {
                write!(f, "Unrecognized API response: {}", raw)
            }
            SerasaError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl Error for SerasaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SerasaError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SerasaError {
    /// Converts a `reqwest::Error` into a `SerasaError`.
    fn from(err: reqwest::Error) -> Self {
        SerasaError::Transport(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `SerasaError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, SerasaError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, SerasaError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, SerasaError> {
    fn context(self, context: impl Into<String>) -> Result<T, SerasaError> {
        self.map_err(|e| SerasaError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, SerasaError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SerasaError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_and_preserves_source() {
        let result: Result<(), SerasaError> = Err(SerasaError::Api("bad cnpj".to_string()));
        let wrapped = result.context("credit check rejected").unwrap_err();

        assert_eq!(
            wrapped.to_string(),
            "credit check rejected: API error: bad cnpj"
        );
        let source = wrapped.source().expect("wrapped error keeps its source");
        assert_eq!(source.to_string(), "API error: bad cnpj");
    }

    #[test]
    fn with_context_is_lazy() {
        let result: Result<i32, SerasaError> = Ok(42);
        let value = result
            .with_context(|| unreachable!("context must not be built on success"))
            .unwrap();
        assert_eq!(value, 42);
    }
}
