#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write session slot: {0}")]
    SlotWrite(std::io::Error),
    #[error("failed to read session slot: {0}")]
    SlotRead(std::io::Error),
    #[error("failed to clear session slot: {0}")]
    SlotClear(std::io::Error),
    #[error("value of {size} bytes exceeds the slot capacity of {capacity} bytes")]
    SlotCapacity { size: usize, capacity: usize },
    #[error(transparent)]
    Imaging(#[from] advisor_imaging::ImagingError),
    #[error("provider request failed: {0}")]
    ProviderRequest(#[from] reqwest::Error),
    #[error("provider returned {status}: {detail}")]
    Provider { status: u16, detail: String },
    #[error("provider returned no completion content")]
    EmptyCompletion,
    #[error("provider returned malformed JSON: {0}")]
    MalformedCompletion(#[from] serde_json::Error),
}

pub type AdvisorResult<T> = std::result::Result<T, AdvisorError>;
