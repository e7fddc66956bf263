use crate::protocol::envelope::XmlError;
use crate::protocol::frame::FramingError;

/// Central service error variants.
///
/// The first four classify inbound-notification failures and map onto the
/// upstream nack codes; the rest are link- and storage-level.
#[derive(Debug, thiserror::Error)]
pub enum CentralError {
    #[error("parsing failure: {0}")]
    Parsing(String),
    #[error("validation failure: {0}")]
    Validation(String),
    #[error("profile failure: {0}")]
    Profile(String),
    #[error("duplicate message")]
    Duplicate,
    #[error("authentication rejected: {0}")]
    Authentication(String),
    #[error("link failure: {0}")]
    Link(String),
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<XmlError> for CentralError {
    fn from(err: XmlError) -> Self {
        Self::Parsing(err.to_string())
    }
}

/// `(resultCode, note code, note message)` for the nack envelope.
pub fn nack_codes(err: &CentralError) -> (&'static str, &'static str, &'static str) {
    match err {
        CentralError::Parsing(_) => ("400", "810", "Message Parsing Error"),
        CentralError::Validation(_) => ("400", "210", "Message Validation Error"),
        CentralError::Profile(_) => ("400", "220", "Profile Violation"),
        CentralError::Duplicate => ("400", "300", "Duplicate Message"),
        _ => ("500", "810", "Internal Error"),
    }
}

pub const ACK_OK: (&str, &str, &str) = ("200", "000", "OK");
