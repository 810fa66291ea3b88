//! FileSystem abstraction so planners can be tested without touching disk

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{DirEntry, FileSystem, FileType};
pub use real::RealFileSystem;
