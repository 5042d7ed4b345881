//! Block categories and their default target lists

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of distraction categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    SocialMedia,
    Shopping,
    News,
    Entertainment,
    Gaming,
    Messaging,
}

impl BlockCategory {
    pub const ALL: [BlockCategory; 6] = [
        BlockCategory::SocialMedia,
        BlockCategory::Shopping,
        BlockCategory::News,
        BlockCategory::Entertainment,
        BlockCategory::Gaming,
        BlockCategory::Messaging,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            BlockCategory::SocialMedia => "Social Media",
            BlockCategory::Shopping => "Shopping",
            BlockCategory::News => "News",
            BlockCategory::Entertainment => "Entertainment",
            BlockCategory::Gaming => "Gaming",
            BlockCategory::Messaging => "Messaging",
        }
    }

    /// Application names blocked by this category
    pub fn default_apps(self) -> &'static [&'static str] {
        match self {
            BlockCategory::SocialMedia => {
                &["Twitter", "Facebook", "Instagram", "TikTok", "LinkedIn", "Reddit"]
            }
            BlockCategory::Shopping => &["Amazon", "eBay", "Etsy"],
            BlockCategory::News => &["News", "Safari", "Arc"],
            BlockCategory::Entertainment => &["YouTube", "Netflix", "Spotify", "Apple TV"],
            BlockCategory::Gaming => &["Steam", "Discord", "Epic Games"],
            BlockCategory::Messaging => &["Slack", "Discord", "WhatsApp", "Telegram", "Messages"],
        }
    }

    /// Domains blocked by this category
    pub fn default_websites(self) -> &'static [&'static str] {
        match self {
            BlockCategory::SocialMedia => &[
                "twitter.com",
                "facebook.com",
                "instagram.com",
                "tiktok.com",
                "linkedin.com",
                "reddit.com",
                "x.com",
            ],
            BlockCategory::Shopping => &["amazon.com", "ebay.com", "etsy.com", "alibaba.com"],
            BlockCategory::News => &[
                "cnn.com",
                "bbc.com",
                "nytimes.com",
                "theguardian.com",
                "reuters.com",
            ],
            BlockCategory::Entertainment => &[
                "youtube.com",
                "netflix.com",
                "hulu.com",
                "twitch.tv",
                "spotify.com",
            ],
            BlockCategory::Gaming => &["steampowered.com", "epicgames.com", "twitch.tv"],
            BlockCategory::Messaging => &[
                "slack.com",
                "discord.com",
                "web.whatsapp.com",
                "web.telegram.org",
            ],
        }
    }
}

impl fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for BlockCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "socialmedia" | "social" => Ok(BlockCategory::SocialMedia),
            "shopping" => Ok(BlockCategory::Shopping),
            "news" => Ok(BlockCategory::News),
            "entertainment" => Ok(BlockCategory::Entertainment),
            "gaming" | "games" => Ok(BlockCategory::Gaming),
            "messaging" => Ok(BlockCategory::Messaging),
            _ => Err(format!("unknown category: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_domain;

    #[test]
    fn category_defaults_are_normalized() {
        for category in BlockCategory::ALL {
            assert!(!category.default_apps().is_empty());
            for site in category.default_websites() {
                assert_eq!(normalize_domain(site).as_deref(), Some(*site), "{category}: {site}");
            }
        }
    }

    #[test]
    fn category_parse_accepts_common_spellings() {
        assert_eq!("socialMedia".parse::<BlockCategory>(), Ok(BlockCategory::SocialMedia));
        assert_eq!("social-media".parse::<BlockCategory>(), Ok(BlockCategory::SocialMedia));
        assert_eq!("Gaming".parse::<BlockCategory>(), Ok(BlockCategory::Gaming));
        assert!("sports".parse::<BlockCategory>().is_err());
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&BlockCategory::SocialMedia).unwrap();
        assert_eq!(json, "\"social_media\"");
    }
}
