/// Configuration management for the engagement engine
///
/// Loads configuration from environment variables.
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Aggregation limits for the discovery surfaces
    pub aggregation: AggregationConfig,
}

/// Limits applied by the feed & discovery aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Default number of tags returned by the popular-tags ranking
    #[serde(default = "default_popular_tags_limit")]
    pub popular_tags_limit: usize,
    /// Number of co-occurring tags suggested on a tag page
    #[serde(default = "default_related_tags_limit")]
    pub related_tags_limit: usize,
}

// Default values
fn default_popular_tags_limit() -> usize {
    10
}

fn default_related_tags_limit() -> usize {
    5
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            popular_tags_limit: default_popular_tags_limit(),
            related_tags_limit: default_related_tags_limit(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let aggregation = AggregationConfig {
            popular_tags_limit: std::env::var("POPULAR_TAGS_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_popular_tags_limit),
            related_tags_limit: std::env::var("RELATED_TAGS_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_related_tags_limit),
        };

        Ok(Config { aggregation })
    }
}
