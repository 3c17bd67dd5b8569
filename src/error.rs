use thiserror::Error;

/// Result type for Calaos operations
pub type Result<T> = std::result::Result<T, CalaosError>;

/// Errors that can occur when interacting with a Calaos server
#[derive(Error, Debug)]
pub enum CalaosError {
    /// HTTP transport error (connection refused, TLS failure, timeout)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unexpected response from the server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server answered but refused the command
    #[error("Command rejected by server for item {id}")]
    CommandRejected {
        /// Id of the item the command targeted
        id: String,
    },

    /// A command was issued on an item whose direction does not permit output
    #[error("Item {id} is not an output")]
    NotAnOutput {
        /// Id of the item the command targeted
        id: String,
    },

    /// A raw state value could not be translated to canonical form
    #[error("Invalid {expected} state value: {value:?}")]
    InvalidState {
        /// What the translator expected to find
        expected: &'static str,
        /// The raw wire value that failed to parse
        value: String,
    },

    /// No Calaos server answered discovery within the timeout
    #[error("No Calaos server discovered")]
    NoServerFound,
}
