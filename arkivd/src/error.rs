use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Store error: {0}")]
    Store(#[from] arkiv_engine::StoreError),

    #[error("Fetch backend error: {0}")]
    Fetcher(#[from] arkiv_engine::FetchError),
}
