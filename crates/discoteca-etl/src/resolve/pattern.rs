//! Parsing of free-form video titles.
//!
//! Music uploads mostly follow "Artist - Title (Official Video) [2009]".
//! These helpers split the artist from the title, strip bracketed noise and
//! find a plausible release year.

/// Separators accepted between artist and title. Surrounding spaces are
/// required so hyphenated names ("Jay-Z", "Lo-Fi") are never split.
const SEPARATORS: &[&str] = &[" - ", " – ", " — "];

/// Bracketed suffixes that describe the upload rather than the song.
const NOISE_PHRASES: &[&str] = &[
    "official video",
    "official music video",
    "official audio",
    "official lyric video",
    "official visualizer",
    "official hd video",
    "official",
    "lyric video",
    "lyrics video",
    "lyrics",
    "lyric",
    "audio",
    "video",
    "visualizer",
    "music video",
    "video oficial",
    "audio oficial",
    "video official",
    "hd",
    "hq",
    "4k",
];

/// Years outside this range are never accepted.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Split "Artist - Title" into its parts, cleaning the title.
///
/// Returns `None` when no separator is present or either side is empty.
pub fn split_artist_title(raw: &str) -> Option<(String, String)> {
    let (idx, sep) = SEPARATORS
        .iter()
        .filter_map(|sep| raw.find(sep).map(|idx| (idx, *sep)))
        .min_by_key(|(idx, _)| *idx)?;

    let artist = collapse_whitespace(&raw[..idx]);
    let title = clean_title(&raw[idx + sep.len()..]);
    (!artist.is_empty() && !title.is_empty()).then_some((artist, title))
}

/// Remove bracketed noise ("(Official Video)", "[Lyrics]") and bracketed
/// years from a title.
pub fn clean_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find(['(', '[']) {
        let close_char = if rest[open..].starts_with('(') { ')' } else { ']' };
        let Some(close_rel) = rest[open + 1..].find(close_char) else {
            break;
        };
        let close = open + 1 + close_rel;
        let inner = &rest[open + 1..close];

        out.push_str(&rest[..open]);
        if !is_noise(inner) {
            out.push_str(&rest[open..=close]);
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);

    let cleaned = collapse_whitespace(&out);
    cleaned
        .trim_end_matches(|c: char| c == '-' || c == '|' || c.is_whitespace())
        .to_string()
}

/// The first standalone 19xx/20xx number in `text`.
pub fn year_in_text(text: &str) -> Option<i32> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(4).enumerate().find_map(|(i, window)| {
        let standalone = (i == 0 || !chars[i - 1].is_alphanumeric())
            && chars.get(i + 4).is_none_or(|c| !c.is_alphanumeric());
        if !standalone || !window.iter().all(char::is_ascii_digit) {
            return None;
        }
        let s: String = window.iter().collect();
        (s.starts_with("19") || s.starts_with("20"))
            .then(|| s.parse().ok())
            .flatten()
    })
}

/// Parse the year out of a `YYYYMMDD` or `YYYY-MM-DD` date.
pub fn year_from_date(date: &str) -> Option<i32> {
    let digits: String = date.chars().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|y| YEAR_RANGE.contains(y))
}

/// Hashtags in `text`, lowercased, without the `#`.
pub fn hashtags(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix('#'))
        .map(|tag| {
            tag.chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '&')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn is_noise(inner: &str) -> bool {
    let lowered = collapse_whitespace(inner).to_lowercase();
    if NOISE_PHRASES.contains(&lowered.as_str()) {
        return true;
    }
    lowered.len() == 4
        && lowered
            .parse::<i32>()
            .is_ok_and(|y| YEAR_RANGE.contains(&y))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_artist_title() {
        assert_eq!(
            split_artist_title("Deadmau5 - Strobe"),
            Some(("Deadmau5".to_string(), "Strobe".to_string()))
        );
        assert_eq!(
            split_artist_title("Avicii – Levels (Official Video)"),
            Some(("Avicii".to_string(), "Levels".to_string()))
        );
        assert_eq!(
            split_artist_title("Jay-Z — 99 Problems"),
            Some(("Jay-Z".to_string(), "99 Problems".to_string()))
        );
    }

    #[test]
    fn test_split_requires_spaced_separator() {
        assert_eq!(split_artist_title("Jay-Z"), None);
        assert_eq!(split_artist_title("Strobe"), None);
        assert_eq!(split_artist_title(" - Strobe"), None);
    }

    #[test]
    fn test_clean_title_strips_noise() {
        assert_eq!(clean_title("Strobe (Official Video)"), "Strobe");
        assert_eq!(clean_title("Levels [Official Audio]"), "Levels");
        assert_eq!(clean_title("One More Time (Lyrics) [2000]"), "One More Time");
        assert_eq!(clean_title("Strobe (Radio Edit)"), "Strobe (Radio Edit)");
        assert_eq!(clean_title("Broken (bracket"), "Broken (bracket");
    }

    #[test]
    fn test_year_in_text() {
        assert_eq!(year_in_text("Strobe (2009)"), Some(2009));
        assert_eq!(year_in_text("1999 - Prince"), Some(1999));
        assert_eq!(year_in_text("Track 12345"), None);
        assert_eq!(year_in_text("abc2009"), None);
        assert_eq!(year_in_text("Mix 1800"), None);
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("20091001"), Some(2009));
        assert_eq!(year_from_date("2009-10-01"), Some(2009));
        assert_eq!(year_from_date("0009"), None);
        assert_eq!(year_from_date("n/a"), None);
    }

    #[test]
    fn test_hashtags() {
        assert_eq!(
            hashtags("New tune! #DeepHouse #house, #2024"),
            vec!["deephouse", "house", "2024"]
        );
        assert!(hashtags("no tags # here").is_empty());
    }
}
