use thiserror::Error;

/// Failures the engine can report. All of them are recovered locally: the
/// rejected operation leaves state untouched and the caller gets the reason.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A settings update carried an out-of-range value.
    #[error("invalid settings: {0}")]
    Validation(String),

    /// The operation is not allowed in the current engine state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Trading cannot start before the feed has produced a price.
    #[error("no price available for {0} yet")]
    NoPriceAvailable(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::Validation("rate percentage must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "invalid settings: rate percentage must be positive"
        );

        let err = EngineError::NoPriceAvailable("BTCUSDT".to_string());
        assert!(err.to_string().contains("BTCUSDT"));
    }
}
