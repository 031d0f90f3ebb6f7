use std::path::PathBuf;

use clap::Parser;

/// Fetch artworks for your MtG decks from Scryfall.
///
/// Reads a deck in Arena format ("4 Lightning Bolt") on stdin and saves
/// every distinct printing of each card under the output directory.
#[derive(Debug, Parser)]
#[command(name = "deck_art_scraper")]
pub struct Cli {
    /// Directory where artworks are stored
    pub outdir: PathBuf,

    /// Additional Scryfall query to filter results
    pub query: Option<String>,

    /// Fetch related tokens too, with an optional custom query
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub tokens: Option<String>,

    /// Secondary Scryfall query to apply wherever the result pool would be
    /// non-empty
    #[arg(long)]
    pub prefer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["deck_art_scraper", "out/"]).unwrap();
        assert_eq!(cli.outdir, PathBuf::from("out/"));
        assert_eq!(cli.query, None);
        assert_eq!(cli.tokens, None);
        assert_eq!(cli.prefer, None);
    }

    #[test]
    fn test_bare_tokens_flag_enables_expansion_without_a_query() {
        let cli = Cli::try_parse_from(["deck_art_scraper", "out/", "--tokens"]).unwrap();
        assert_eq!(cli.tokens, Some("".to_string()));
    }

    #[test]
    fn test_tokens_flag_accepts_an_extra_query() {
        let cli =
            Cli::try_parse_from(["deck_art_scraper", "out/", "--tokens=frame:2015"]).unwrap();
        assert_eq!(cli.tokens, Some("frame:2015".to_string()));
    }

    #[test]
    fn test_filter_and_prefer_queries() {
        let cli = Cli::try_parse_from([
            "deck_art_scraper",
            "out/",
            "lang:en",
            "--prefer",
            "set:mh2",
        ])
        .unwrap();
        assert_eq!(cli.query, Some("lang:en".to_string()));
        assert_eq!(cli.prefer, Some("set:mh2".to_string()));
    }

    #[test]
    fn test_outdir_is_required() {
        assert!(Cli::try_parse_from(["deck_art_scraper"]).is_err());
    }
}
