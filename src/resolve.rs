//! Short link resolution
//!
//! A short link is resolved by letting the client follow the redirect chain
//! and reading the URL it ended up on. A cheap `HEAD` goes first; some
//! servers refuse `HEAD` outright, so an error status there triggers a full
//! `GET` whose final URL is used instead.

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::{RelayError, Result};

/// Which request produced the final URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolveMethod {
    #[serde(rename = "HEAD_follow")]
    HeadFollow,
    #[serde(rename = "GET_follow")]
    GetFollow,
}

/// Where one request landed after following redirects
#[derive(Debug, Clone)]
pub struct Landing {
    pub url: Url,
    pub status: StatusCode,
}

/// Outcome of resolving a short link
#[derive(Debug, Clone)]
pub struct Resolution {
    pub head: Landing,
    /// Present only when the `HEAD` landing had an error status
    pub fallback: Option<Landing>,
}

impl Resolution {
    /// The final URL as reported to callers: the fallback's when one was made.
    pub fn final_url(&self) -> &Url {
        &self.landing().url
    }

    pub fn method(&self) -> ResolveMethod {
        if self.fallback.is_some() {
            ResolveMethod::GetFollow
        } else {
            ResolveMethod::HeadFollow
        }
    }

    /// Like `final_url`, but a fallback that itself failed does not replace
    /// the `HEAD` landing.
    pub fn best_effort_url(&self) -> &Url {
        match &self.fallback {
            Some(fallback) if !is_error_status(fallback.status) => &fallback.url,
            _ => &self.head.url,
        }
    }

    fn landing(&self) -> &Landing {
        self.fallback.as_ref().unwrap_or(&self.head)
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// Follow the redirect chain of `url` and report where it ends.
pub async fn resolve(client: &Client, url: &Url) -> Result<Resolution> {
    let response = client.head(url.clone()).send().await?;
    let head = Landing {
        url: response.url().clone(),
        status: response.status(),
    };
    debug!("HEAD {} landed on {} ({})", url, head.url, head.status);

    if !is_error_status(head.status) {
        return Ok(Resolution {
            head,
            fallback: None,
        });
    }

    // Only the landing URL matters; the body is never read.
    let response = client.get(url.clone()).send().await?;
    let fallback = Landing {
        url: response.url().clone(),
        status: response.status(),
    };
    debug!(
        "GET fallback for {} landed on {} ({})",
        url, fallback.url, fallback.status
    );

    Ok(Resolution {
        head,
        fallback: Some(fallback),
    })
}

/// Validate the `url` query parameter of a request.
pub fn parse_target(raw: Option<&str>) -> Result<Url> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(RelayError::InvalidInput("URL is required".to_string()));
    }

    let url = Url::parse(raw)
        .map_err(|e| RelayError::InvalidInput(format!("Invalid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(RelayError::InvalidInput(
            "URL must start with http:// or https://".to_string(),
        )),
    }
}
