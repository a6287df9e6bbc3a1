//! The error returned when a retried operation ends in failure.

/// Why a retried operation gave up. Both variants carry the last error
/// the operation produced.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed.
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: E },

    /// The retry predicate rejected the error; no further attempts were
    /// made.
    #[error("attempt {attempt} failed with a non-retryable error: {source}")]
    Aborted { attempt: u32, source: E },
}

impl<E> RetryError<E> {
    /// Returns the last error the operation produced.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { source, .. } | Self::Aborted { source, .. } => source,
        }
    }

    /// Borrows the last error the operation produced.
    pub fn last_error(&self) -> &E {
        match self {
            Self::Exhausted { source, .. } | Self::Aborted { source, .. } => source,
        }
    }

    /// Number of times the operation was invoked.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            Self::Aborted { attempt, .. } => *attempt,
        }
    }

    /// Returns `true` if the attempt budget ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
