use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Place rejected at registration (non-positive radius, bad center).
    InvalidPlace(String),
    /// Position sample outside the valid coordinate range.
    InvalidSample { latitude: f64, longitude: f64 },
    InvalidItem(String),
    DuplicateItem(String),
    UnknownItem(String),
    UnknownPlace(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidPlace(msg) => write!(f, "invalid place: {msg}"),
            CoreError::InvalidSample {
                latitude,
                longitude,
            } => write!(f, "invalid sample: ({latitude}, {longitude}) is out of range"),
            CoreError::InvalidItem(msg) => write!(f, "invalid item: {msg}"),
            CoreError::DuplicateItem(name) => write!(f, "item already tracked: {name}"),
            CoreError::UnknownItem(name) => write!(f, "unknown item: {name}"),
            CoreError::UnknownPlace(id) => write!(f, "unknown place: {id}"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;
