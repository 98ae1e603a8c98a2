use std::fmt;

#[derive(Debug)]
pub enum ReportError {
    PayloadParse(String),
    InvalidConfiguration(String),
    UnplaceableContent(String),
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::PayloadParse(message) => {
                write!(f, "analysis payload could not be parsed: {}", message)
            }
            ReportError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ReportError::UnplaceableContent(message) => {
                write!(f, "content cannot fit on any page: {}", message)
            }
            ReportError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(value: std::io::Error) -> Self {
        ReportError::Io(value)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(value: serde_json::Error) -> Self {
        ReportError::PayloadParse(value.to_string())
    }
}
