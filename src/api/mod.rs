//! Workspace API access: authenticated client and file enumeration.

mod client;
mod error;
mod files;
mod types;

pub use client::{ApiClient, ApiCredentials, HttpTimeouts, build_http_client};
pub use error::{ClientError, ListError};
pub use files::{ApiFileSource, FileSource, PAGE_SIZE};
pub use types::{FileDescriptor, FileListing, FileScope};
