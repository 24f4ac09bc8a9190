use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Reject a zero-length rolling window at the API boundary.
pub fn ensure_window(name: &str, window: usize) -> Result<(), AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "{} must be at least 1",
            name
        )));
    }
    Ok(())
}
