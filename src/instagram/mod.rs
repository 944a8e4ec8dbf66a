//! Client for the Instagram Graph API media listing.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

/// Fields requested from the media endpoint.
const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,thumbnail_url,permalink,timestamp";

/// A failure talking to the media endpoint. The scheduler treats every
/// variant as a skipped cycle, never as fatal.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to media endpoint failed")]
    Request(#[from] reqwest::Error),
    #[error("media endpoint returned HTTP {status}")]
    Status { status: StatusCode },
    #[error("malformed media listing")]
    Malformed(#[from] serde_json::Error),
}

/// A single media item from the Graph API listing.
///
/// `id` is the only field the detection logic compares; everything else is
/// display material for the notification embed.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPost {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub permalink: String,
    /// Raw Graph API timestamp, e.g. `2024-05-01T10:00:00+0000`. Parsed
    /// lazily when the embed footer is rendered.
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaListing {
    #[serde(default)]
    data: Option<Vec<MediaPost>>,
}

/// Fetch the most recent post, or `None` when the account has no media.
///
/// The listing is most-recent-first, so "latest" is simply the first element.
/// An absent or empty `data` field is a valid empty listing, not an error.
///
/// # Errors
///
/// Returns [`SourceError`] on network failure, a non-2xx status, or a
/// response body that does not decode as a media listing.
pub async fn fetch_latest(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Option<MediaPost>, SourceError> {
    let url = format!("{}/me/media", config.api_base_url);
    let response = client
        .get(&url)
        .query(&[
            ("fields", MEDIA_FIELDS),
            ("access_token", config.access_token.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status { status });
    }

    let body = response.text().await?;
    let listing: MediaListing = serde_json::from_str(&body)?;

    Ok(listing.data.unwrap_or_default().into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_takes_first_item() {
        let listing: MediaListing = serde_json::from_str(
            r#"{
                "data": [
                    {"id": "111", "permalink": "https://www.instagram.com/reel/aaa/"},
                    {"id": "222", "permalink": "https://www.instagram.com/reel/bbb/"}
                ]
            }"#,
        )
        .unwrap();
        let latest = listing.data.unwrap_or_default().into_iter().next().unwrap();
        assert_eq!(latest.id, "111");
    }

    #[test]
    fn test_listing_with_full_item() {
        let listing: MediaListing = serde_json::from_str(
            r#"{
                "data": [{
                    "id": "17900000000000000",
                    "caption": "sunset",
                    "media_type": "VIDEO",
                    "media_url": "https://cdn.example.com/v.mp4",
                    "thumbnail_url": "https://cdn.example.com/t.jpg",
                    "permalink": "https://www.instagram.com/reel/abc/",
                    "timestamp": "2024-05-01T10:00:00+0000"
                }]
            }"#,
        )
        .unwrap();
        let post = listing.data.unwrap_or_default().into_iter().next().unwrap();
        assert_eq!(post.id, "17900000000000000");
        assert_eq!(post.caption.as_deref(), Some("sunset"));
        assert_eq!(post.thumbnail_url.as_deref(), Some("https://cdn.example.com/t.jpg"));
        assert_eq!(post.timestamp.as_deref(), Some("2024-05-01T10:00:00+0000"));
    }

    #[test]
    fn test_listing_empty_data_is_none() {
        let listing: MediaListing = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(listing.data.unwrap_or_default().into_iter().next().is_none());
    }

    #[test]
    fn test_listing_missing_data_is_none() {
        let listing: MediaListing = serde_json::from_str("{}").unwrap();
        assert!(listing.data.unwrap_or_default().into_iter().next().is_none());
    }

    #[test]
    fn test_listing_ignores_unknown_fields() {
        let listing: MediaListing = serde_json::from_str(
            r#"{"data": [{"id": "1", "permalink": "https://x/", "like_count": 5}], "paging": {}}"#,
        )
        .unwrap();
        assert!(listing.data.unwrap_or_default().into_iter().next().is_some());
    }
}
