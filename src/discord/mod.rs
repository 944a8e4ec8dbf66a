//! Discord webhook delivery and embed formatting.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::instagram::MediaPost;

const HEADLINE: &str = "\u{1f6a8} **New Instagram Reel just dropped!** \u{1f525}";
const EMBED_TITLE: &str = "\u{1f3a5} New Instagram Reel!";
const BUTTON_LABEL: &str = "\u{1f3ac} View Reel";
const WEBHOOK_USERNAME: &str = "Instagram Alerts";
const INSTAGRAM_ICON_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/a/a5/Instagram_icon.png";
const NO_CAPTION_PLACEHOLDER: &str = "(No caption)";

/// Instagram brand pink.
const EMBED_COLOR: u32 = 0x00E1_306C;

/// Captions longer than this are cut to [`CAPTION_TRUNCATED_LEN`] plus `...`.
const CAPTION_LIMIT: usize = 200;
const CAPTION_TRUNCATED_LEN: usize = 197;

/// Fixed-second units for relative-time rendering, largest first. No
/// calendar-aware month or year arithmetic.
const INTERVALS: &[(i64, &str)] = &[
    (31_536_000, "year"),
    (2_592_000, "month"),
    (604_800, "week"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
    (1, "second"),
];

/// A failure delivering a notification. Exactly one attempt is made per
/// detected post; there is no retry.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to webhook failed")]
    Request(#[from] reqwest::Error),
    #[error("webhook rejected notification with HTTP {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<Embed>,
    pub components: Vec<ActionRow>,
}

#[derive(Debug, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub url: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: String,
}

/// Discord component container (type 1).
#[derive(Debug, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<LinkButton>,
}

/// Discord link-style button (type 2, style 5).
#[derive(Debug, Serialize)]
pub struct LinkButton {
    #[serde(rename = "type")]
    pub kind: u8,
    pub label: String,
    pub style: u8,
    pub url: String,
}

/// Deliver a notification for `post` to the configured webhook.
///
/// A non-2xx response is logged with the verbatim response body.
///
/// # Errors
///
/// Returns [`DeliveryError`] on network failure or webhook rejection.
pub async fn notify(
    client: &reqwest::Client,
    config: &Config,
    post: &MediaPost,
) -> Result<(), DeliveryError> {
    let payload = build_payload(post, Utc::now());

    let response = client
        .post(&config.webhook_url)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Webhook rejected notification");
        return Err(DeliveryError::Rejected { status, body });
    }

    info!(permalink = %post.permalink, "Notification delivered");
    Ok(())
}

/// Build the webhook payload for `post`, with `now` as the reference time
/// for the footer's relative timestamp.
#[must_use]
pub fn build_payload(post: &MediaPost, now: DateTime<Utc>) -> WebhookPayload {
    let posted = post
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .map_or_else(
            || "just now".to_string(),
            |ts| relative_time((now - ts).num_seconds()),
        );

    WebhookPayload {
        content: HEADLINE.to_string(),
        username: WEBHOOK_USERNAME.to_string(),
        avatar_url: INSTAGRAM_ICON_URL.to_string(),
        embeds: vec![Embed {
            title: EMBED_TITLE.to_string(),
            description: truncate_caption(post.caption.as_deref()),
            url: post.permalink.clone(),
            color: EMBED_COLOR,
            image: post
                .thumbnail_url
                .clone()
                .or_else(|| post.media_url.clone())
                .map(|url| EmbedImage { url }),
            footer: EmbedFooter {
                text: format!("\u{1f4f8} Posted {posted} on Instagram"),
                icon_url: INSTAGRAM_ICON_URL.to_string(),
            },
            timestamp: now.to_rfc3339(),
        }],
        components: vec![ActionRow {
            kind: 1,
            components: vec![LinkButton {
                kind: 2,
                label: BUTTON_LABEL.to_string(),
                style: 5,
                url: post.permalink.clone(),
            }],
        }],
    }
}

/// Render elapsed seconds as e.g. `"3 days ago"`, using the largest unit
/// whose count reaches 1. Anything under a second is `"just now"`.
fn relative_time(elapsed_secs: i64) -> String {
    for &(unit_secs, label) in INTERVALS {
        let count = elapsed_secs / unit_secs;
        if count >= 1 {
            let plural = if count > 1 { "s" } else { "" };
            return format!("{count} {label}{plural} ago");
        }
    }
    "just now".to_string()
}

fn truncate_caption(caption: Option<&str>) -> String {
    match caption {
        Some(text) if text.chars().count() > CAPTION_LIMIT => {
            let mut truncated: String = text.chars().take(CAPTION_TRUNCATED_LEN).collect();
            truncated.push_str("...");
            truncated
        }
        Some(text) => text.to_string(),
        None => NO_CAPTION_PLACEHOLDER.to_string(),
    }
}

/// The Graph API emits `+0000` offsets, which strict RFC 3339 parsing
/// rejects; accept both forms.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
