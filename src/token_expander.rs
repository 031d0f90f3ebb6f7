use log::{debug, error};

use crate::cards::cardname::CardName;
use crate::report::FailureReport;
use crate::scryfall_client::{PrintingStream, RelatedPart, ScryfallClient};

/// A token related to a deck card, carrying its display name for directory
/// naming and its own printing stream.
pub struct TokenPrintings {
    pub name: String,
    pub stream: PrintingStream,
}

pub struct TokenExpander {
    client: ScryfallClient,
    extra_query: String,
}

impl TokenExpander {
    pub fn new(client: ScryfallClient, extra_query: String) -> Self {
        TokenExpander {
            client,
            extra_query,
        }
    }

    /// Tokens associated with `name`, each resolved into its own printing
    /// stream. A token that cannot be resolved lands in the token namespace
    /// of `report` without blocking its siblings. A failed parent lookup
    /// yields no tokens at all; token fetching is a best-effort extra.
    pub async fn expand(&self, name: &CardName, report: &FailureReport) -> Vec<TokenPrintings> {
        let card = match self.client.lookup_exact(name.as_str()).await {
            Ok(card) => card,
            Err(e) => {
                debug!("token lookup for '{}' skipped: {}", name, e);
                return Vec::new();
            }
        };

        let mut tokens = Vec::new();
        for part in card.all_parts.iter().filter(|p| p.component == "token") {
            match self.resolve_token(part).await {
                Ok(token) => tokens.push(token),
                Err((token_name, reason)) => {
                    error!("    Token: No results found for '{}'!", token_name);
                    report.record_token_failure(&token_name, &reason);
                }
            }
        }
        tokens
    }

    /// Token printings are searched by oracle identity so every printed
    /// version of the token is found, not just the referenced one.
    async fn resolve_token(&self, part: &RelatedPart) -> Result<TokenPrintings, (String, String)> {
        let token = self
            .client
            .lookup_by_id(&part.id)
            .await
            .map_err(|e| (part.name.clone(), e.to_string()))?;

        let oracle_id = match token.oracle_id {
            Some(oracle_id) => oracle_id,
            None => return Err((token.name, "token has no oracle id".to_string())),
        };

        let mut query = format!("oracleid:{}", oracle_id);
        if !self.extra_query.is_empty() {
            query.push(' ');
            query.push_str(&self.extra_query);
        }

        let stream = self
            .client
            .search_printings(&query)
            .await
            .map_err(|e| (token.name.clone(), e.to_string()))?;

        Ok(TokenPrintings {
            name: token.name,
            stream,
        })
    }
}
