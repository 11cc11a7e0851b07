use thiserror::Error;

#[derive(Error, Debug)]
pub enum GendagError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "Job graph too large: depth {depth} with {children} children per node exceeds the limit of {limit} jobs"
    )]
    GraphTooLarge { depth: u32, children: u32, limit: u64 },

    #[error(
        "Job ids too large: depth {depth} with {children} children per node needs more than {limit} bytes of ids"
    )]
    IdsTooLarge { depth: u32, children: u32, limit: u64 },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist output file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, GendagError>;
