use serde::{Deserialize, Serialize};

use crate::taxonomy::Decade;

/// Filters for catalog searches. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    /// Literal substring of the artist, ignoring ASCII case.
    pub artist: Option<String>,
    /// Literal substring of the title, ignoring ASCII case.
    pub title: Option<String>,
    /// Exact genre.
    pub genre: Option<String>,
    pub decade: Option<Decade>,
    pub limit: Option<u32>,
}

impl SongFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub const fn decade(mut self, decade: Decade) -> Self {
        self.decade = Some(decade);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the WHERE clause (possibly empty) and its positional params.
    pub(crate) fn to_sql(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(artist) = &self.artist {
            params.push(format!("%{}%", escape_like(artist)));
            conditions.push(format!("artist LIKE ?{} ESCAPE '\\'", params.len()));
        }
        if let Some(title) = &self.title {
            params.push(format!("%{}%", escape_like(title)));
            conditions.push(format!("title LIKE ?{} ESCAPE '\\'", params.len()));
        }
        if let Some(genre) = &self.genre {
            params.push(genre.clone());
            conditions.push(format!("genre = ?{}", params.len()));
        }
        if let Some(decade) = &self.decade {
            params.push(decade.to_string());
            conditions.push(format!("decade = ?{}", params.len()));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

/// Make `%`, `_` and `\` match themselves in a `LIKE ... ESCAPE '\'`.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Aggregate counts over the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_songs: u64,
    pub total_size_bytes: u64,
    /// (genre, count), most populous first.
    pub by_genre: Vec<(String, u64)>,
    /// (decade, count), newest decade first, "Unknown" last.
    pub by_decade: Vec<(String, u64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_where_clause() {
        let (clause, params) = SongFilter::new().to_sql();
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_numbers_params_in_order() {
        let (clause, params) = SongFilter::new()
            .artist("mau5")
            .genre("House")
            .decade(Decade::Known(2000))
            .to_sql();
        assert_eq!(
            clause,
            " WHERE artist LIKE ?1 ESCAPE '\\' AND genre = ?2 AND decade = ?3"
        );
        assert_eq!(params, vec!["%mau5%", "House", "2000s"]);
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        let (_, params) = SongFilter::new().artist("100%").title("a_b\\c").to_sql();
        assert_eq!(params, vec!["%100\\%%", "%a\\_b\\\\c%"]);
    }
}
