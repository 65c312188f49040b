//! Keyword matching against the genre vocabulary.

use regex::Regex;

use discoteca_core::taxonomy::GENRE_KEYWORDS;

/// Compiled matcher for [`GENRE_KEYWORDS`].
///
/// Keywords are tried longest first and must stand as whole words, so
/// "deep house" beats "house" and "rap" does not match "trapped".
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
    keyword: &'static str,
    /// The keyword without spaces, for matching hashtags like "#deephouse".
    compact: String,
    genre: &'static str,
    pattern: Regex,
}

impl KeywordTable {
    pub fn new() -> Self {
        let mut entries: Vec<Entry> = GENRE_KEYWORDS
            .iter()
            .filter_map(|&(keyword, genre)| {
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword))).ok()?;
                Some(Entry {
                    keyword,
                    compact: keyword.replace([' ', '-'], ""),
                    genre,
                    pattern,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.keyword.len().cmp(&a.keyword.len()));
        Self { entries }
    }

    /// The genre of the first (longest) keyword found in `text`.
    pub fn find(&self, text: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.pattern.is_match(text))
            .map(|e| e.genre)
    }

    /// The genre for a hashtag ("deephouse", "drum&bass", "techno").
    pub fn find_hashtag(&self, tag: &str) -> Option<&'static str> {
        let compact = tag.replace('_', "").to_lowercase();
        self.entries
            .iter()
            .find(|e| e.compact == compact)
            .map(|e| e.genre)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}
