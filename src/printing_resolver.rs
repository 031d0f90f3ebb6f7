use log::debug;

use crate::cards::cardname::CardName;
use crate::scryfall_client::{PrintingStream, ScryfallClient};

/// A card that could not be resolved into any printings. Returned as a value
/// so the run keeps going and reports at the end.
#[derive(Debug)]
pub struct ResolutionFailure {
    pub name: String,
    pub reason: String,
}

pub struct PrintingResolver {
    client: ScryfallClient,
    filter: Option<String>,
    prefer: Option<String>,
}

impl PrintingResolver {
    pub fn new(client: ScryfallClient, filter: Option<String>, prefer: Option<String>) -> Self {
        PrintingResolver {
            client,
            filter,
            prefer,
        }
    }

    /// All printings of `name`. The stricter preferred query wins whenever it
    /// matches anything at all; otherwise the base query decides. Zero
    /// results and not-found errors from the catalog are the same failure.
    pub async fn resolve(&self, name: &CardName) -> Result<PrintingStream, ResolutionFailure> {
        if let Some(prefer) = self.prefer.as_deref() {
            let query = self.compose_query(name, Some(prefer));
            match self.client.search_printings(&query).await {
                Ok(stream) => return Ok(stream),
                Err(e) => debug!("preferred query '{}' found nothing usable: {}", query, e),
            }
        }

        let query = self.compose_query(name, None);
        self.client
            .search_printings(&query)
            .await
            .map_err(|e| ResolutionFailure {
                name: name.as_str().to_string(),
                reason: e.to_string(),
            })
    }

    fn compose_query(&self, name: &CardName, prefer: Option<&str>) -> String {
        // A quote inside the name would terminate the exact clause early.
        let escaped = name.as_str().replace('"', "\\\"");
        let mut query = format!("!\"{}\"", escaped);
        for clause in [self.filter.as_deref(), prefer] {
            if let Some(clause) = clause {
                if !clause.is_empty() {
                    query.push(' ');
                    query.push_str(clause);
                }
            }
        }
        query
    }
}
