use std::fmt::{self, Display};
use std::io;

/// Provides `EpiCityError` and maps other errors to
/// convert to an `EpiCityError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiCityError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    InvalidParameter(String),
    EpiCityError(String),
}

impl From<io::Error> for EpiCityError {
    fn from(error: io::Error) -> Self {
        EpiCityError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiCityError {
    fn from(error: serde_json::Error) -> Self {
        EpiCityError::JsonError(error)
    }
}

impl From<String> for EpiCityError {
    fn from(error: String) -> Self {
        EpiCityError::EpiCityError(error)
    }
}

impl From<&str> for EpiCityError {
    fn from(error: &str) -> Self {
        EpiCityError::EpiCityError(error.to_string())
    }
}

impl std::error::Error for EpiCityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpiCityError::IoError(error) => Some(error),
            EpiCityError::JsonError(error) => Some(error),
            EpiCityError::InvalidParameter(_) | EpiCityError::EpiCityError(_) => None,
        }
    }
}

impl Display for EpiCityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpiCityError::IoError(error) => write!(f, "I/O error: {error}"),
            EpiCityError::JsonError(error) => write!(f, "JSON error: {error}"),
            EpiCityError::InvalidParameter(message) => {
                write!(f, "Invalid parameter: {message}")
            }
            EpiCityError::EpiCityError(message) => write!(f, "Error: {message}"),
        }
    }
}
