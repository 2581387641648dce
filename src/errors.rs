//! Error types for the hostel desk.

use thiserror::Error;

use crate::record::RecordId;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Missing or invalid field: {field}")]
    Validation { field: &'static str },

    #[error("Room {room_id} is already at capacity ({capacity})")]
    Capacity { room_id: RecordId, capacity: u32 },

    #[error("Room not found: {0}")]
    RoomNotFound(RecordId),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Never surfaced from a load; the adapter logs it and falls back to seed data.
    #[error("Unreadable value under '{key}': {reason}")]
    StorageRead { key: String, reason: String },

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("A suggestion request is already in flight")]
    Busy,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DeskError {
    pub fn missing(field: &'static str) -> Self {
        Self::Validation { field }
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
