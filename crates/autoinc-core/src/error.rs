use thiserror::Error;

use autoinc_model::ModelError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid generator spec: {0}")]
    Model(#[from] ModelError),

    #[error("no tokio runtime to drive generator '{0}'")]
    NoRuntime(String),

    #[error("generator '{0}' is exhausted")]
    Exhausted(String),

    #[error("producer task failed: {0}")]
    Producer(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
