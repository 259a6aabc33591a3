//! Result type alias for PhiGate
//!
//! This module provides a convenient Result type alias that uses PhiGateError
//! as the error type.

use super::errors::PhiGateError;

/// Result type alias for PhiGate operations
///
/// # Examples
///
/// ```
/// use phigate::domain::result::Result;
/// use phigate::domain::errors::PhiGateError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(PhiGateError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, PhiGateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PhiGateError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(PhiGateError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
