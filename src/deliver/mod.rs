//! # Delivery
//!
//! Hands the saved poster to external channels. Each enabled publisher runs
//! on its own; a failed delivery is logged and never touches the image that
//! was already written.
//!
//! | Publisher | Channel |
//! |-----------|---------|
//! | [`DiscordPublisher`] | bot message with the poster attached |
//! | [`RedditPublisher`] | image post to a subreddit |

mod discord;
mod reddit;

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;

pub use discord::DiscordPublisher;
pub use reddit::{MediaLease, RedditPublisher};

/// Delivery failures. Logged, never fatal.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{0} rejected the post: {1}")]
    Rejected(&'static str, String),

    #[error("Failed to read poster: {0}")]
    Io(#[from] std::io::Error),
}

/// Caption and title sent alongside the poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub caption: String,
    pub title: String,
}

impl Announcement {
    pub fn for_date(date: NaiveDate) -> Self {
        let human = date.format("%B %-d, %Y");
        Self {
            caption: format!("Daily Item Shop {}:", human),
            title: format!("Item Shop for {}", human),
        }
    }
}

/// An external channel the poster can be sent to.
pub trait Publisher {
    fn name(&self) -> &'static str;
    fn publish(&self, image: &Path, announcement: &Announcement) -> Result<(), DeliveryError>;
}

/// Publishers enabled in the configuration.
pub fn publishers(config: &Config, client: &reqwest::blocking::Client) -> Vec<Box<dyn Publisher>> {
    let mut out: Vec<Box<dyn Publisher>> = Vec::new();
    if config.discord.enabled {
        out.push(Box::new(DiscordPublisher::new(client.clone(), &config.discord)));
    }
    if config.reddit.enabled {
        out.push(Box::new(RedditPublisher::new(client.clone(), &config.reddit)));
    }
    out
}

/// Run every publisher, returning how many succeeded.
pub fn deliver_all(publishers: &[Box<dyn Publisher>], image: &Path, announcement: &Announcement) -> usize {
    let mut delivered = 0;
    for publisher in publishers {
        match publisher.publish(image, announcement) {
            Ok(()) => {
                info!("Delivered {} to {}", image.display(), publisher.name());
                delivered += 1;
            }
            Err(e) => error!("Failed to deliver to {}, {}", publisher.name(), e),
        }
    }
    delivered
}

/// Turn a non-success response into [`DeliveryError::Status`].
fn check_status(
    endpoint: &str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(DeliveryError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Stub {
        name: &'static str,
        fail: bool,
        calls: Cell<usize>,
    }

    impl Publisher for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn publish(&self, _: &Path, _: &Announcement) -> Result<(), DeliveryError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(DeliveryError::Rejected(self.name, "nope".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_announcement_text() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        let a = Announcement::for_date(date);
        assert_eq!(a.caption, "Daily Item Shop June 5, 2024:");
        assert_eq!(a.title, "Item Shop for June 5, 2024");
    }

    #[test]
    fn test_failure_does_not_stop_other_publishers() {
        let publishers: Vec<Box<dyn Publisher>> = vec![
            Box::new(Stub {
                name: "first",
                fail: true,
                calls: Cell::new(0),
            }),
            Box::new(Stub {
                name: "second",
                fail: false,
                calls: Cell::new(0),
            }),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let delivered = deliver_all(&publishers, Path::new("shop.png"), &Announcement::for_date(date));
        assert_eq!(delivered, 1);
    }

    #[test]
    fn test_disabled_publishers_are_skipped() {
        let client = reqwest::blocking::Client::new();
        assert!(publishers(&Config::default(), &client).is_empty());
    }
}
