use crate::client::ApiResponse;
use crate::error::{HarnessError, HarnessResult};

/// Fails the enclosing scenario with [`HarnessError::Assertion`] when the
/// condition does not hold.
#[macro_export]
macro_rules! check {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::HarnessError::Assertion(format!($($arg)+)));
        }
    };
}

pub fn expect_status(response: &ApiResponse, accepted: &[u16], context: &str) -> HarnessResult<()> {
    if response.status_in(accepted) {
        return Ok(());
    }
    Err(HarnessError::Assertion(format!(
        "{context}: expected status {accepted:?}, got {}. Response: {}",
        response.status_code(),
        response.text
    )))
}
