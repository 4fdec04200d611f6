pub mod codec;
pub mod jellyfin;
pub mod plex;
pub mod retry;
pub mod traits;

pub use jellyfin::JellyfinAdapter;
pub use plex::PlexAdapter;
pub use traits::{LibraryRepository, MediaAdapter, MetadataRepository, Page, PlaylistRepository};
