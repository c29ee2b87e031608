//! Workspace domain: sandboxed file access and language detection.

mod language;
mod store;

pub use language::language_for_path;
pub use store::WorkspaceStore;
