use thiserror::Error;

use lendscope_db::DatabaseError;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Malformed raw payload for snapshot {snapshot_id}: {message}")]
    MalformedPayload { snapshot_id: i32, message: String },
}
