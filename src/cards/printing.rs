use std::collections::HashMap;

use serde::Deserialize;

use crate::utilities::string_manipulators::clean_file_name;

/// One printing of a card as returned by the Scryfall search API. The `id` is
/// unique per printing and stable across pages, which makes it the
/// deduplication key. `image_uris` is absent for layouts without direct
/// artwork, e.g. double-faced cards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Printing {
    pub id: String,
    pub name: String,
    pub set: String,
    pub collector_number: String,
    #[serde(default)]
    pub image_uris: Option<HashMap<String, String>>,
}

impl Printing {
    /// URL of the artwork for the given image kind, if this printing exposes
    /// direct artwork at all.
    pub fn image_url(&self, kind: &str) -> Option<&str> {
        self.image_uris
            .as_ref()
            .and_then(|uris| uris.get(kind))
            .map(|url| url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Canonical file name: `{name}_{SET}_{collector}.{ext}` with spaces
    /// underscored and apostrophes/commas removed.
    pub fn file_name(&self, kind: &str) -> String {
        let base = clean_file_name(&format!(
            "{}_{}_{}",
            self.name,
            self.set.to_uppercase(),
            self.collector_number
        ));
        format!("{}.{}", base, image_extension(kind))
    }

    /// Human-readable identity for log lines and failure records.
    pub fn label(&self) -> String {
        format!(
            "{} ({} {})",
            self.name,
            self.set.to_uppercase(),
            self.collector_number
        )
    }
}

/// Scryfall serves the `png` kind as PNG and every other kind as JPEG.
pub fn image_extension(kind: &str) -> &'static str {
    match kind {
        "png" => "png",
        _ => "jpg",
    }
}
