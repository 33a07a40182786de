//! Error taxonomy for the scroller.
//!
//! Load and resolution failures are absorbed by the session and only logged.
//! `UnsupportedEnvironment` and `InvalidConfig` are the only errors a host
//! ever sees, both at mount time.

use thiserror::Error;

use crate::models::ImageRef;

#[derive(Debug, Error)]
pub enum ScrollerError {
    /// The address was unreachable or the bytes could not be decoded.
    #[error("failed to load image {reference}: {reason}")]
    LoadFailure { reference: ImageRef, reason: String },

    /// The identifier could not be mapped to a fetchable address.
    #[error("image path could not be interpreted: {path}")]
    Resolution { path: String },

    /// The rendering surface lacks a drawing primitive the scroller needs.
    #[error("rendering surface does not support {missing}")]
    UnsupportedEnvironment { missing: &'static str },

    /// A load was requested while another one is still in flight.
    #[error("a load is already in flight for {in_flight}")]
    LoadBusy { in_flight: ImageRef },

    /// The same reference was requested twice in one session.
    #[error("image {0} was already requested in this session")]
    DuplicateRequest(ImageRef),

    #[error("invalid scroller configuration: {0}")]
    InvalidConfig(String),

    #[error("scroller session has been torn down")]
    TornDown,
}

impl ScrollerError {
    /// Errors that leave the frame loop running.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScrollerError::LoadFailure { .. } | ScrollerError::Resolution { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrollerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_resolution_are_recoverable() {
        let reference = ImageRef::new("a.jpg", "local");
        let err = ScrollerError::LoadFailure {
            reference,
            reason: "truncated".into(),
        };
        assert!(err.is_recoverable());
        assert!(ScrollerError::Resolution { path: "x".into() }.is_recoverable());
        assert!(!ScrollerError::UnsupportedEnvironment { missing: "images" }.is_recoverable());
    }

    #[test]
    fn test_messages_name_the_reference() {
        let err = ScrollerError::DuplicateRequest(ImageRef::new("/p/q.jpg", "cpuvisor"));
        assert!(err.to_string().contains("/p/q.jpg"));
    }
}
