use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::cards::printing::Printing;
use crate::utilities::constants::{APP_USER_AGENT, SCRYFALL_API_URL};

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

#[derive(Debug)]
pub enum ScryfallError {
    /// The catalog answered but found nothing: a structured 404 error object
    /// or an empty result list.
    NoResults,
    Request(reqwest::Error),
    BadApiResponse(String),
    Json(serde_json::Error),
}

impl fmt::Display for ScryfallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScryfallError::NoResults => write!(f, "no results found"),
            ScryfallError::Request(e) => write!(f, "request failed: {}", e),
            ScryfallError::BadApiResponse(msg) => write!(f, "unexpected api response: {}", msg),
            ScryfallError::Json(e) => write!(f, "malformed api response: {}", e),
        }
    }
}

impl std::error::Error for ScryfallError {}

impl From<reqwest::Error> for ScryfallError {
    fn from(err: reqwest::Error) -> Self {
        ScryfallError::Request(err)
    }
}

impl From<serde_json::Error> for ScryfallError {
    fn from(err: serde_json::Error) -> Self {
        ScryfallError::Json(err)
    }
}

/// A card as returned by the named/by-id lookup endpoints, reduced to the
/// fields token expansion needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub name: String,
    pub oracle_id: Option<String>,
    #[serde(default)]
    pub all_parts: Vec<RelatedPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedPart {
    pub id: String,
    pub name: String,
    pub component: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    has_more: bool,
    next_page: Option<String>,
    data: Vec<Printing>,
}

#[derive(Clone)]
pub struct ScryfallClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(base_url: Option<&str>, client: reqwest::Client) -> Self {
        ScryfallClient {
            client,
            base_url: base_url.unwrap_or(SCRYFALL_API_URL).to_string(),
        }
    }

    fn setup_http_headers() -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        header_map.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("*/*"),
        );
        header_map.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(APP_USER_AGENT),
        );
        header_map
    }

    /// Searches for every printing matching `query`, release-ordered with
    /// per-print uniqueness so the result walk is reproducible run to run.
    pub async fn search_printings(&self, query: &str) -> Result<PrintingStream, ScryfallError> {
        let url = format!(
            "{}/cards/search?q={}&unique=prints&order=released",
            self.base_url,
            urlencoding::encode(query)
        );

        let page: SearchPage = self.get_json(&url).await?;
        if page.data.is_empty() {
            return Err(ScryfallError::NoResults);
        }
        Ok(PrintingStream::new(self.clone(), page))
    }

    /// Looks a card up by its exact name.
    pub async fn lookup_exact(&self, name: &str) -> Result<CardRecord, ScryfallError> {
        let url = format!(
            "{}/cards/named?exact={}",
            self.base_url,
            urlencoding::encode(name)
        );
        self.get_json(&url).await
    }

    /// Looks a card up by its Scryfall id.
    pub async fn lookup_by_id(&self, id: &str) -> Result<CardRecord, ScryfallError> {
        let url = format!("{}/cards/{}", self.base_url, id);
        self.get_json(&url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScryfallError> {
        let response = self.send_with_retry(url).await?;
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScryfallError::NoResults);
        }
        if !status.is_success() {
            return Err(ScryfallError::BadApiResponse(format!(
                "{} for {}",
                status, url
            )));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Retries timeouts and connection failures with a doubling delay.
    /// Anything else is handed back immediately.
    async fn send_with_retry(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt = 1;
        loop {
            match self
                .client
                .get(url)
                .headers(Self::setup_http_headers())
                .send()
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) if attempt < RETRY_ATTEMPTS && is_transient(&e) => {
                    debug!(
                        "attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt, RETRY_ATTEMPTS, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Lazy pager over one search's result list. Pages are fetched on demand as
/// the stream is consumed; consuming the stream exhausts it.
pub struct PrintingStream {
    client: ScryfallClient,
    buffered: VecDeque<Printing>,
    next_page: Option<String>,
}

impl PrintingStream {
    fn new(client: ScryfallClient, first_page: SearchPage) -> Self {
        let next_page = if first_page.has_more {
            first_page.next_page
        } else {
            None
        };
        PrintingStream {
            client,
            buffered: first_page.data.into(),
            next_page,
        }
    }

    /// Next printing in release order, fetching further pages as needed.
    /// `Ok(None)` once the result set is exhausted.
    pub async fn next(&mut self) -> Result<Option<Printing>, ScryfallError> {
        loop {
            if let Some(printing) = self.buffered.pop_front() {
                return Ok(Some(printing));
            }

            let url = match self.next_page.take() {
                Some(url) => url,
                None => return Ok(None),
            };

            let page: SearchPage = self.client.get_json(&url).await?;
            self.next_page = if page.has_more { page.next_page } else { None };
            self.buffered = page.data.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn card_json(id: &str, name: &str, set: &str, collector_number: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "set": set,
            "collector_number": collector_number,
            "image_uris": { "png": format!("https://cards.scryfall.io/png/{}.png", id) }
        })
    }

    fn search_query_matcher(q: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), q.into()),
            Matcher::UrlEncoded("unique".into(), "prints".into()),
            Matcher::UrlEncoded("order".into(), "released".into()),
        ])
    }

    async fn test_server() -> mockito::ServerGuard {
        std::thread::spawn(|| mockito::Server::new())
            .join()
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_yields_printings_across_pages() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let first_page = server
            .mock("GET", "/cards/search")
            .match_query(search_query_matcher("!\"Opt\""))
            .with_status(200)
            .with_body(
                json!({
                    "has_more": true,
                    "next_page": format!("{}/cards/search-page-two", server.url()),
                    "data": [card_json("aaa", "Opt", "xln", "65"), card_json("bbb", "Opt", "dom", "60")]
                })
                .to_string(),
            )
            .create();
        let second_page = server
            .mock("GET", "/cards/search-page-two")
            .with_status(200)
            .with_body(
                json!({
                    "has_more": false,
                    "data": [card_json("ccc", "Opt", "eld", "59")]
                })
                .to_string(),
            )
            .create();

        let mut stream = client.search_printings("!\"Opt\"").await.unwrap();

        let mut ids = Vec::new();
        while let Some(printing) = stream.next().await.unwrap() {
            ids.push(printing.id);
        }

        first_page.assert();
        second_page.assert();
        assert_eq!(ids, vec!["aaa", "bbb", "ccc"]);
    }

    #[tokio::test]
    async fn test_later_pages_are_fetched_lazily() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let _first_page = server
            .mock("GET", "/cards/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "has_more": true,
                    "next_page": format!("{}/cards/search-page-two", server.url()),
                    "data": [card_json("aaa", "Opt", "xln", "65")]
                })
                .to_string(),
            )
            .create();
        let second_page = server
            .mock("GET", "/cards/search-page-two")
            .expect(0)
            .create();

        let mut stream = client.search_printings("!\"Opt\"").await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.id, "aaa");

        // Only once the buffered page runs dry may the pager go back out.
        second_page.assert();
    }

    #[tokio::test]
    async fn test_search_not_found_is_no_results() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let _mock = server
            .mock("GET", "/cards/search")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(
                json!({
                    "object": "error",
                    "code": "not_found",
                    "details": "Your query didn't match any cards."
                })
                .to_string(),
            )
            .create();

        let result = client.search_printings("!\"No Such Card\"").await;
        assert!(matches!(result, Err(ScryfallError::NoResults)));
    }

    #[tokio::test]
    async fn test_search_with_empty_result_list_is_no_results() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let _mock = server
            .mock("GET", "/cards/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "has_more": false, "data": [] }).to_string())
            .create();

        let result = client.search_printings("!\"No Such Card\"").await;
        assert!(matches!(result, Err(ScryfallError::NoResults)));
    }

    #[tokio::test]
    async fn test_server_errors_are_not_no_results() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let _mock = server
            .mock("GET", "/cards/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("upstream exploded")
            .create();

        let result = client.search_printings("!\"Opt\"").await;
        assert!(matches!(result, Err(ScryfallError::BadApiResponse(_))));
    }

    #[tokio::test]
    async fn test_lookup_exact_parses_related_parts() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let mock = server
            .mock("GET", "/cards/named")
            .match_query(Matcher::UrlEncoded(
                "exact".into(),
                "Grave Titan".into(),
            ))
            .with_status(200)
            .with_body(
                json!({
                    "id": "titan-id",
                    "name": "Grave Titan",
                    "oracle_id": "titan-oracle",
                    "all_parts": [
                        { "id": "titan-id", "name": "Grave Titan", "component": "combo_piece" },
                        { "id": "zombie-id", "name": "Zombie", "component": "token" }
                    ]
                })
                .to_string(),
            )
            .create();

        let card = client.lookup_exact("Grave Titan").await.unwrap();

        mock.assert();
        assert_eq!(card.name, "Grave Titan");
        assert_eq!(card.all_parts.len(), 2);
        assert_eq!(card.all_parts[1].component, "token");
    }

    #[tokio::test]
    async fn test_lookup_by_id_returns_record_without_parts() {
        let mut server = test_server().await;
        let client = ScryfallClient::new(Some(&server.url()), reqwest::Client::new());

        let _mock = server
            .mock("GET", "/cards/zombie-id")
            .with_status(200)
            .with_body(
                json!({
                    "id": "zombie-id",
                    "name": "Zombie",
                    "oracle_id": "zombie-oracle"
                })
                .to_string(),
            )
            .create();

        let card = client.lookup_by_id("zombie-id").await.unwrap();
        assert_eq!(card.oracle_id.as_deref(), Some("zombie-oracle"));
        assert!(card.all_parts.is_empty());
    }
}
