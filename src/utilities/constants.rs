pub const SCRYFALL_API_URL: &str = "https://api.scryfall.com";

pub const TOKENS_DIR: &str = "_tokens";

pub const APP_USER_AGENT: &str = "deck_art_scraper/0.1";

pub const IMAGE_KINDS: [&str; 6] = ["png", "large", "normal", "small", "art_crop", "border_crop"];

pub const DEFAULT_IMAGE_KIND: &str = "png";
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
