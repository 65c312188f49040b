//! Source URL normalization.
//!
//! YouTube links arrive in many shapes (`youtu.be` short links, playlist
//! and timestamp parameters, mobile hosts). They are reduced to a canonical
//! `https://www.youtube.com/watch?v=<id>` so the same video is always
//! recorded under the same URL. Other URLs pass through unchanged.

use url::Url;

use crate::error::DownloadError;

/// A parsed, normalized source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    url: String,
    video_id: Option<String>,
}

impl SourceLink {
    /// Parse and normalize a user-supplied URL.
    ///
    /// # Errors
    /// Returns [`DownloadError::InvalidUrl`] when the input is not an
    /// absolute http(s) URL.
    pub fn parse(input: &str) -> Result<Self, DownloadError> {
        let trimmed = input.trim();
        let parsed = Url::parse(trimmed).map_err(|e| DownloadError::InvalidUrl {
            url: trimmed.to_string(),
            message: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl {
                url: trimmed.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        match youtube_video_id(&parsed) {
            Some(id) => Ok(Self {
                url: format!("https://www.youtube.com/watch?v={id}"),
                video_id: Some(id),
            }),
            None => Ok(Self {
                url: trimmed.to_string(),
                video_id: None,
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The YouTube video id, when the URL points at a single video.
    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }
}

impl std::fmt::Display for SourceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

fn youtube_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("shorts" | "embed" | "live") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&id).then_some(id)
}

fn is_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
