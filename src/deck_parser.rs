use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::cards::cardname::CardName;

lazy_static! {
    // Arena format: "4 Lightning Bolt"
    static ref COUNTED_LINE: Regex = Regex::new(r"^\d+\s+(.+)$").unwrap();
}

const SECTION_HEADERS: [&str; 2] = ["sideboard", "deck"];

/// Parses an Arena format deck list into its distinct card names, sorted so
/// repeated runs walk the deck in the same order. Blank lines, section
/// headers and lines without a leading count are dropped without comment.
pub fn parse_deck_list(input: &str) -> Vec<CardName> {
    let mut names: BTreeSet<CardName> = BTreeSet::new();

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || is_section_header(line) {
            continue;
        }

        if let Some(captures) = COUNTED_LINE.captures(line) {
            if let Ok(name) = CardName::new(&captures[1]) {
                names.insert(name);
            }
        }
    }

    names.into_iter().collect()
}

fn is_section_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    SECTION_HEADERS
        .iter()
        .any(|header| lower.starts_with(header))
}
