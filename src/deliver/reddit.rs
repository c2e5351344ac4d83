//! Reddit image post delivery.
//!
//! Four requests: password-grant token, media asset lease, upload to the
//! leased bucket, then the submission pointing at the uploaded file.

use std::path::Path;

use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use tracing::debug;

use super::{Announcement, DeliveryError, Publisher, check_status};
use crate::config::RedditConfig;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Upload target handed out by `/api/media/asset.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaLease {
    args: LeaseArgs,
}

#[derive(Debug, Clone, Deserialize)]
struct LeaseArgs {
    action: String,
    fields: Vec<LeaseField>,
}

#[derive(Debug, Clone, Deserialize)]
struct LeaseField {
    name: String,
    value: String,
}

impl MediaLease {
    /// Absolute upload URL; leases use protocol-relative actions.
    pub fn upload_url(&self) -> String {
        match self.args.action.strip_prefix("//") {
            Some(rest) => format!("https://{}", rest),
            None => self.args.action.clone(),
        }
    }

    /// Public URL of the uploaded file.
    pub fn image_url(&self) -> Option<String> {
        self.args
            .fields
            .iter()
            .find(|f| f.name == "key")
            .map(|key| format!("{}/{}", self.upload_url(), key.value))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    json: SubmitBody,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitBody {
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Submits the poster as an image post.
pub struct RedditPublisher {
    client: Client,
    config: RedditConfig,
}

impl RedditPublisher {
    pub fn new(client: Client, config: &RedditConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    fn token(&self) -> Result<String, DeliveryError> {
        let params = [
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];
        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .header("User-Agent", &self.config.user_agent)
            .form(&params)
            .send()?;
        let token: TokenResponse = check_status(TOKEN_URL, response)?.json()?;
        Ok(token.access_token)
    }

    fn lease(&self, token: &str, filename: &str) -> Result<MediaLease, DeliveryError> {
        let endpoint = format!("{}/api/media/asset.json", OAUTH_BASE);
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(token)
            .header("User-Agent", &self.config.user_agent)
            .form(&[("filepath", filename), ("mimetype", "image/png")])
            .send()?;
        Ok(check_status(&endpoint, response)?.json()?)
    }

    fn upload(&self, lease: &MediaLease, image: &Path) -> Result<(), DeliveryError> {
        let mut form = multipart::Form::new();
        for field in &lease.args.fields {
            form = form.text(field.name.clone(), field.value.clone());
        }
        form = form.file("file", image)?;
        let url = lease.upload_url();
        debug!("Uploading poster to {}", url);
        let response = self.client.post(&url).multipart(form).send()?;
        check_status(&url, response)?;
        Ok(())
    }

    fn submit(&self, token: &str, url: &str, title: &str) -> Result<(), DeliveryError> {
        let endpoint = format!("{}/api/submit", OAUTH_BASE);
        let mut params = vec![
            ("sr", self.config.subreddit.as_str()),
            ("kind", "image"),
            ("title", title),
            ("url", url),
            ("api_type", "json"),
            ("resubmit", "true"),
        ];
        if let Some(flair) = &self.config.flair_id {
            params.push(("flair_id", flair.as_str()));
        }
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(token)
            .header("User-Agent", &self.config.user_agent)
            .form(&params)
            .send()?;
        let body: SubmitResponse = check_status(&endpoint, response)?.json()?;
        if !body.json.errors.is_empty() {
            return Err(DeliveryError::Rejected(
                "Reddit",
                serde_json::Value::Array(body.json.errors).to_string(),
            ));
        }
        Ok(())
    }
}

impl Publisher for RedditPublisher {
    fn name(&self) -> &'static str {
        "Reddit"
    }

    fn publish(&self, image: &Path, announcement: &Announcement) -> Result<(), DeliveryError> {
        if !image.is_file() {
            return Err(DeliveryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", image.display()),
            )));
        }
        let filename = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("itemshop.png");

        let token = self.token()?;
        let lease = self.lease(&token, filename)?;
        let url = lease
            .image_url()
            .ok_or_else(|| DeliveryError::Rejected("Reddit", "media lease has no key".to_string()))?;
        self.upload(&lease, image)?;
        self.submit(&token, &url, &announcement.title)
    }
}
