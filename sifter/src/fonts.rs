//! Font preflight and stylesheet links
//!
//! Records may name a hosted web font. The page shell links one stylesheet per
//! unique font, and an optional preflight checks that each one resolves before
//! the server starts.

use async_trait::async_trait;
use sifter_common::{Error, Result};
use std::time::Duration;
use tracing::info;

pub const GOOGLE_FONTS_URL: &str = "https://fonts.googleapis.com";

/// Marker in the page shell replaced by the font links
pub const FONT_LINKS_MARKER: &str = "<!-- FONT_LINKS -->";

const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "Mozilla/5.0";

/// Checks that named fonts can be served to the browser
#[async_trait]
pub trait FontValidator: Send + Sync {
    /// Fails with `Error::FontUnavailable` on the first font that cannot be fetched
    async fn validate(&self, fonts: &[String]) -> Result<()>;
}

/// Stylesheet URL for one font family
pub fn stylesheet_url(base_url: &str, font: &str) -> String {
    format!(
        "{}/css2?family={}&display=swap",
        base_url.trim_end_matches('/'),
        font.replace(' ', "+")
    )
}

/// One `<link rel="stylesheet">` per font, newline separated
pub fn font_links<'a>(fonts: impl IntoIterator<Item = &'a String>) -> String {
    fonts
        .into_iter()
        .map(|font| {
            format!(
                r#"<link href="{}" rel="stylesheet">"#,
                escape_html(&stylesheet_url(GOOGLE_FONTS_URL, font))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page shell with the font links substituted for the marker
pub fn render_index<'a>(template: &str, fonts: impl IntoIterator<Item = &'a String>) -> String {
    template.replace(FONT_LINKS_MARKER, &font_links(fonts))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fetches each font's stylesheet from a Google Fonts compatible host
pub struct GoogleFontsValidator {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleFontsValidator {
    pub fn new() -> Result<Self> {
        Self::with_base_url(GOOGLE_FONTS_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PREFLIGHT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl FontValidator for GoogleFontsValidator {
    async fn validate(&self, fonts: &[String]) -> Result<()> {
        if fonts.is_empty() {
            return Ok(());
        }
        info!("Validating {} font(s)...", fonts.len());

        for font in fonts {
            let url = stylesheet_url(&self.base_url, font);
            let response = self.client.get(&url).send().await.map_err(|e| {
                Error::FontUnavailable {
                    font: font.clone(),
                    reason: format!("could not fetch: {}", e),
                }
            })?;

            let status = response.status();
            if status != reqwest::StatusCode::OK {
                return Err(Error::FontUnavailable {
                    font: font.clone(),
                    reason: format!("HTTP {}", status.as_u16()),
                });
            }
            info!("  OK: {}", font);
        }
        Ok(())
    }
}
