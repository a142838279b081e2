use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported file type '{extension}' for {file_name}")]
    UnsupportedFormat { file_name: String, extension: String },

    #[error("Failed to extract text from {file_name}: {cause}")]
    Extraction { file_name: String, cause: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn extraction(file_name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Extraction {
            file_name: file_name.into(),
            cause: cause.to_string(),
        }
    }

    pub fn unsupported(file_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            file_name: file_name.into(),
            extension: extension.into(),
        }
    }

    /// Name of the document the error originated from, when there is one.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedFormat { file_name, .. } | Self::Extraction { file_name, .. } => {
                Some(file_name)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
