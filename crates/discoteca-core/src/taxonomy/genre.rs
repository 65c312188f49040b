//! Genre vocabulary.
//!
//! [`GENRE_KEYWORDS`] is the fixed table used by keyword-based genre
//! detection. Each entry maps a lowercase keyword, as it appears in free
//! text, to the canonical genre name used for the library folder. Matching
//! is done longest keyword first with word boundaries, so "deep house"
//! wins over "house" and "trap" never matches inside "trapped".

/// Genre folder for songs nothing could classify.
pub const UNCLASSIFIED: &str = "Sin Clasificar";

/// Values that mean "no genre" when read back from tags or user input.
const UNCLASSIFIED_ALIASES: &[&str] = &["sin clasificar", "unknown", "desconocido", "other", ""];

/// Words kept upper-case when normalizing genre names.
const ACRONYMS: &[&str] = &["edm", "r&b", "uk", "idm", "dnb"];

/// Keyword -> canonical genre table.
pub const GENRE_KEYWORDS: &[(&str, &str)] = &[
    ("tribal afro house", "Afro House"),
    ("progressive trance", "Progressive Trance"),
    ("progressive house", "Progressive House"),
    ("uplifting trance", "Uplifting Trance"),
    ("melodic techno", "Melodic Techno"),
    ("minimal techno", "Minimal Techno"),
    ("electro house", "Electro House"),
    ("melodic house", "Melodic House"),
    ("drum and bass", "Drum & Bass"),
    ("vocal trance", "Vocal Trance"),
    ("future house", "Future House"),
    ("tribal house", "Tribal House"),
    ("french house", "French House"),
    ("ghetto house", "Ghetto House"),
    ("drum & bass", "Drum & Bass"),
    ("future bass", "Future Bass"),
    ("hard trance", "Hard Trance"),
    ("dub techno", "Dub Techno"),
    ("acid house", "Acid House"),
    ("deep house", "Deep House"),
    ("tech house", "Tech House"),
    ("bass house", "Bass House"),
    ("afro house", "Afro House"),
    ("uk garage", "UK Garage"),
    ("big room", "Big Room"),
    ("psytrance", "Psytrance"),
    ("hardstyle", "Hardstyle"),
    ("synthwave", "Synthwave"),
    ("vaporwave", "Vaporwave"),
    ("reggaeton", "Reggaeton"),
    ("downtempo", "Downtempo"),
    ("chillout", "Chillout"),
    ("hardcore", "Hardcore"),
    ("amapiano", "Amapiano"),
    ("afrobeat", "Afrobeat"),
    ("bassline", "Bassline"),
    ("footwork", "Footwork"),
    ("trap music", "Trap"),
    ("hip hop", "Hip Hop"),
    ("hip-hop", "Hip Hop"),
    ("dubstep", "Dubstep"),
    ("bachata", "Bachata"),
    ("ambient", "Ambient"),
    ("techno", "Techno"),
    ("trance", "Trance"),
    ("garage", "UK Garage"),
    ("jungle", "Jungle"),
    ("electro", "Electro"),
    ("minimal", "Minimal"),
    ("house", "House"),
    ("latin", "Latin"),
    ("salsa", "Salsa"),
    ("disco", "Disco"),
    ("metal", "Metal"),
    ("blues", "Blues"),
    ("reggae", "Reggae"),
    ("lo-fi", "Lo-Fi"),
    ("lofi", "Lo-Fi"),
    ("funk", "Funk"),
    ("jazz", "Jazz"),
    ("rock", "Rock"),
    ("trap", "Trap"),
    ("gqom", "Gqom"),
    ("r&b", "R&B"),
    ("edm", "EDM"),
    ("dnb", "Drum & Bass"),
    ("rap", "Rap"),
    ("pop", "Pop"),
];

/// Whether `genre` means "unclassified" (empty, "Unknown", the sentinel...).
pub fn is_unclassified(genre: &str) -> bool {
    let lowered = genre.trim().to_lowercase();
    UNCLASSIFIED_ALIASES.contains(&lowered.as_str())
}

/// Normalize a raw genre string into display form.
///
/// Collapses whitespace and title-cases each word (including the parts of
/// hyphenated words), keeping a few acronyms upper-case. Returns `None`
/// for values that mean "unclassified" or are too short to be a genre.
pub fn normalize_genre(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if is_unclassified(&collapsed) || collapsed.chars().count() < 2 {
        return None;
    }

    let words: Vec<String> = collapsed
        .split(' ')
        .map(|word| {
            word.split('-')
                .map(title_case_word)
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect();

    Some(words.join(" "))
}

fn title_case_word(word: &str) -> String {
    let lowered = word.to_lowercase();
    if ACRONYMS.contains(&lowered.as_str()) {
        return lowered.to_uppercase();
    }
    let mut chars = lowered.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unclassified() {
        assert!(is_unclassified("Sin Clasificar"));
        assert!(is_unclassified("  unknown "));
        assert!(is_unclassified(""));
        assert!(!is_unclassified("House"));
    }

    #[test]
    fn test_normalize_genre_title_cases() {
        assert_eq!(normalize_genre("deep house"), Some("Deep House".to_string()));
        assert_eq!(normalize_genre("  PROGRESSIVE   trance "), Some("Progressive Trance".to_string()));
        assert_eq!(normalize_genre("lo-fi"), Some("Lo-Fi".to_string()));
    }

    #[test]
    fn test_normalize_genre_keeps_acronyms() {
        assert_eq!(normalize_genre("edm"), Some("EDM".to_string()));
        assert_eq!(normalize_genre("r&b"), Some("R&B".to_string()));
        assert_eq!(normalize_genre("uk garage"), Some("UK Garage".to_string()));
    }

    #[test]
    fn test_normalize_genre_rejects_unclassified() {
        assert_eq!(normalize_genre("unknown"), None);
        assert_eq!(normalize_genre("x"), None);
        assert_eq!(normalize_genre("   "), None);
    }

    #[test]
    fn test_keyword_table_is_lowercase_and_canonical() {
        for (keyword, genre) in GENRE_KEYWORDS {
            assert_eq!(*keyword, keyword.to_lowercase(), "keyword {keyword} must be lowercase");
            assert!(!is_unclassified(genre));
        }
    }
}
