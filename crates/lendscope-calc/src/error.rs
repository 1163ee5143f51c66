use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid data: {0}")]
    InvalidData(String),
}
