#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record not found: {collection}/{id}")]
    NotFound {
        collection: &'static str,
        id: String,
    },
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to allocate a unique record id after 5 attempts")]
    IdAllocation,
    #[error("failed to write record: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("invalid text: {0}")]
    Text(#[from] transtrack_types::TextError),
    #[error("invalid identifier: {0}")]
    Id(#[from] transtrack_types::IdError),
}

pub type TrackResult<T> = std::result::Result<T, TrackError>;
