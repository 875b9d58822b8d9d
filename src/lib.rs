pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod edit;
pub mod events;
pub mod import;
pub mod project;
pub mod request;
pub mod session;

pub use cache::SourceFileCache;
pub use edit::{EditModel, EntityId};
pub use import::{DiskImporter, ImportBackend, SourceFileData};
pub use request::CompilationRequest;
pub use session::EditorSession;
