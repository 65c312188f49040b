pub mod ids;
pub mod metadata;
pub mod song;

pub use ids::SongId;
pub use metadata::{MetadataCandidate, Overrides};
pub use song::{DownloadSource, SongRecord};
