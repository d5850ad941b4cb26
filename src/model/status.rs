use serde::Deserialize;

/// The status object the service returns for errors and for write operations such as rating a movie.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    // error statuses leave this out
    #[serde(default)]
    pub success: Option<bool>,
    pub status_code: i32,
    pub status_message: String,
}

impl StatusResponse {
    /// Parses an error status body. Bodies that aren't status objects are ignored.
    pub(crate) fn from_error_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }
}
