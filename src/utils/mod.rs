/// Repository input normalization
pub mod path;
/// Retry helper with linear backoff
pub mod retry;

pub use path::normalize_repo_input;
pub use retry::with_retry;
