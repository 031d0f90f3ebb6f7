use std::collections::HashSet;

use crate::cards::printing::Printing;
use crate::scryfall_client::{PrintingStream, ScryfallError};

/// First-occurrence filter over printing streams. The caller picks the scope:
/// a fresh deduper per card pass, and one shared deduper across all of a
/// card's token streams.
pub struct PrintingDeduper {
    seen: HashSet<String>,
}

impl PrintingDeduper {
    pub fn new() -> Self {
        PrintingDeduper {
            seen: HashSet::new(),
        }
    }

    /// Next printing whose id has not been yielded through this deduper yet.
    /// Consumes the stream incrementally, so pagination stays lazy.
    pub async fn next(
        &mut self,
        stream: &mut PrintingStream,
    ) -> Result<Option<Printing>, ScryfallError> {
        while let Some(printing) = stream.next().await? {
            if self.seen.insert(printing.id.clone()) {
                return Ok(Some(printing));
            }
        }
        Ok(None)
    }
}
