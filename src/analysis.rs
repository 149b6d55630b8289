//! Video analysis
//!
//! Turns a resolved video page URL into its aweme id and fetches the video
//! metadata for that id from the configured analysis API.

use reqwest::{Client, Url};
use tracing::warn;

use crate::error::{RelayError, Result};

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

/// Extract the aweme id from a video page URL.
///
/// `/video/<digits>` anywhere in the URL takes precedence; otherwise the
/// `modal_id` query parameter is used (the form the web feed links to).
pub fn extract_video_id(url: &Url) -> Option<String> {
    if let Some(caps) = regex!(r"/video/(\d+)").captures(url.as_str()) {
        return Some(caps[1].to_string());
    }

    url.query_pairs()
        .find(|(key, _)| key == "modal_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Query the analysis API for one video
pub async fn fetch_video(client: &Client, api_url: &str, aweme_id: &str) -> Result<serde_json::Value> {
    let response = client
        .get(api_url)
        .query(&[("aweme_id", aweme_id)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!("Analysis API returned {} for aweme_id={}", status, aweme_id);
        return Err(RelayError::AnalysisApi {
            status: status.as_u16(),
        });
    }

    Ok(response.json().await?)
}
