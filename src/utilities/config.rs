use std::env;

use log::error;

use crate::utilities::constants::{
    DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_IMAGE_KIND, DEFAULT_REQUEST_TIMEOUT_SECS, IMAGE_KINDS,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub image_kind: String,
    pub download_concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_kind: DEFAULT_IMAGE_KIND.to_string(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.update_from_env();
        config
    }

    fn update_from_env(&mut self) {
        if let Ok(kind) = env::var("IMAGE_KIND") {
            if IMAGE_KINDS.contains(&kind.as_str()) {
                self.image_kind = kind;
            } else {
                error!(
                    "'{}' is not a Scryfall image kind, keeping '{}'",
                    kind, self.image_kind
                );
            }
        }
        if let Ok(concurrency) = env::var("DOWNLOAD_CONCURRENCY") {
            self.download_concurrency = concurrency
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_DOWNLOAD_CONCURRENCY);
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT") {
            self.request_timeout_secs = timeout.parse().unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        }
    }
}

lazy_static::lazy_static! {
    pub static ref CONFIG: Config = Config::new();
}
