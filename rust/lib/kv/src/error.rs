use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
