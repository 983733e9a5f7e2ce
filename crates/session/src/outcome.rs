//! Mutation result shape.

use shopsync_client::ApiError;

/// Result of a mutation entry point.
///
/// The synchronizer never propagates [`ApiError`] to callers for expected
/// failure modes; the UI only needs "did it work" and a displayable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T = ()> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    /// Successful outcome carrying data.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Successful outcome with a display message.
    #[must_use]
    pub fn ok_with(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    /// Failed outcome with a display message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Failed outcome from an API error, using its user-facing message.
    #[must_use]
    pub fn from_error(error: &ApiError) -> Self {
        Self::failed(error.user_message())
    }
}

impl Outcome<()> {
    /// Successful outcome with no payload.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            success: true,
            message: None,
            data: Some(()),
        }
    }

    /// Successful outcome with no payload and a display message.
    #[must_use]
    pub fn done_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(()),
        }
    }
}
