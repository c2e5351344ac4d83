//! Discord bot delivery.

use std::path::Path;

use reqwest::blocking::{Client, multipart};
use tracing::debug;

use super::{Announcement, DeliveryError, Publisher, check_status};
use crate::config::DiscordConfig;

const API_BASE: &str = "https://discord.com/api/v10";

/// Posts the poster as an attachment in a channel.
pub struct DiscordPublisher {
    client: Client,
    token: String,
    channel_id: String,
    api_base: String,
}

impl DiscordPublisher {
    pub fn new(client: Client, config: &DiscordConfig) -> Self {
        Self {
            client,
            token: config.token.clone(),
            channel_id: config.channel_id.clone(),
            api_base: API_BASE.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/channels/{}/messages", self.api_base, self.channel_id)
    }
}

impl Publisher for DiscordPublisher {
    fn name(&self) -> &'static str {
        "Discord"
    }

    fn publish(&self, image: &Path, announcement: &Announcement) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({ "content": announcement.caption });
        let form = multipart::Form::new()
            .text("payload_json", payload.to_string())
            .file("files[0]", image)?;

        let endpoint = self.endpoint();
        debug!("POST {}", endpoint);
        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bot {}", self.token))
            .multipart(form)
            .send()?;
        check_status(&endpoint, response)?;
        Ok(())
    }
}
