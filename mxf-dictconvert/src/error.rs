use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictConvertError {
    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dictionary entry on line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },

    #[error("UL \"{0}\" does not decode to 16 bytes")]
    InvalidUl(String),

    #[error(transparent)]
    Dictionary(#[from] mxf_dictionary::DictionaryError),
}

pub type Result<T> = std::result::Result<T, DictConvertError>;
