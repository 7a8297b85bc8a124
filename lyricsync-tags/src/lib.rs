pub mod error;
pub mod library;
pub mod lofty_source;

pub use error::TagsError;
pub use library::{rescan, scan_files, RescanReport};
pub use lofty_source::LoftyMetadata;
