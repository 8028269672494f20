//! Data models for the catalog

pub mod author;
pub mod exemplar;
pub mod work;

// Re-export commonly used types
pub use author::{Author, AuthorData};
pub use exemplar::{CopyData, CopyStatus, Exemplar};
pub use work::{Work, WorkData};
