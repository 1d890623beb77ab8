/// Shared plumbing error used internally by every crate in the workspace.
///
/// This is distinct from [`crate::tool::ErrorKind`], which is the *wire*
/// vocabulary a `ToolResult` carries to callers. Internal errors get mapped
/// onto that closed set at the dispatcher boundary.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("config: {0}")]
    Config(String),

    #[error("upstream rejected: {0}")]
    UpstreamRejected(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
