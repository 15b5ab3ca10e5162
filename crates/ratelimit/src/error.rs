use thiserror::Error;

/// Failure of a request run through the executor or the queue
#[derive(Debug, Error)]
pub enum RequestError<E> {
    /// Non rate-limit error, returned on the first occurrence
    #[error("{operation} failed: {source}")]
    Failed { operation: String, source: E },

    #[error("{operation} still rate limited after {max_retries} retries: {last_error}")]
    MaxRetriesExceeded {
        operation: String,
        max_retries: u32,
        last_error: E,
    },

    #[error("request queue shut down before {operation} completed")]
    QueueClosed { operation: String },
}

impl<E> RequestError<E> {
    pub fn operation(&self) -> &str {
        match self {
            RequestError::Failed { operation, .. }
            | RequestError::MaxRetriesExceeded { operation, .. }
            | RequestError::QueueClosed { operation } => operation,
        }
    }

    /// The upstream error, if one was observed
    pub fn inner(&self) -> Option<&E> {
        match self {
            RequestError::Failed { source, .. } => Some(source),
            RequestError::MaxRetriesExceeded { last_error, .. } => Some(last_error),
            RequestError::QueueClosed { .. } => None,
        }
    }

    pub fn is_max_retries(&self) -> bool {
        matches!(self, RequestError::MaxRetriesExceeded { .. })
    }
}
