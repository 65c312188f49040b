pub mod decade;
pub mod genre;

pub use decade::Decade;
pub use genre::{is_unclassified, normalize_genre, GENRE_KEYWORDS, UNCLASSIFIED};
