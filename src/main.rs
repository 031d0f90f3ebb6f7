mod cards;
mod cli;
mod deck_parser;
mod dedup;
mod image_downloader;
mod printing_resolver;
mod report;
mod scryfall_client;
mod token_expander;
mod utilities;

use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::future::join_all;
use log::{error, info};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use cards::cardname::CardName;
use cli::Cli;
use dedup::PrintingDeduper;
use image_downloader::{DownloadOutcome, ImageDownloader};
use printing_resolver::PrintingResolver;
use report::FailureReport;
use scryfall_client::{PrintingStream, ScryfallClient};
use token_expander::TokenExpander;
use utilities::config::CONFIG;
use utilities::constants::TOKENS_DIR;
use utilities::file_management::ensure_dir;

const INTERACTIVE_HINT: &str = "\
Reading the deck from the terminal. Paste cards in Arena format, e.g.:
1 Lightning Bolt
1 Llanowar Elves
1 Opt
then press Ctrl+D to fetch them.";

const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Cli::parse();

    if std::io::stdin().is_terminal() {
        println!("{}", INTERACTIVE_HINT);
    }
    let mut deck_text = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut deck_text) {
        error!("Could not read the deck list: {}", e);
        std::process::exit(1);
    }

    let status = tokio::select! {
        status = run(args, &deck_text) => match status {
            Ok(status) => status,
            Err(e) => {
                error!("{}", e);
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted.");
            EXIT_INTERRUPTED
        }
    };
    std::process::exit(status);
}

/// Whole run: parse the deck, resolve card after card, fan the downloads out
/// over a bounded pool, then render the failure report into an exit code.
async fn run(args: Cli, deck_text: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let names = deck_parser::parse_deck_list(deck_text);
    info!("Deck list contains {} distinct cards", names.len());

    ensure_dir(&args.outdir)?;
    info!("Made directory '{}'!", args.outdir.display());
    let tokens_dir = args.outdir.join(TOKENS_DIR);
    if args.tokens.is_some() {
        ensure_dir(&tokens_dir)?;
        info!("Made directory '{}'!", tokens_dir.display());
    }

    let http = reqwest::Client::new();
    let client = ScryfallClient::new(None, http.clone());

    let mut pipeline = Pipeline {
        resolver: PrintingResolver::new(client.clone(), args.query, args.prefer),
        expander: args.tokens.map(|extra| TokenExpander::new(client, extra)),
        downloader: Arc::new(ImageDownloader::new(
            http,
            &CONFIG.image_kind,
            Duration::from_secs(CONFIG.request_timeout_secs),
        )),
        report: Arc::new(FailureReport::new()),
        semaphore: Arc::new(Semaphore::new(CONFIG.download_concurrency)),
        downloads: Vec::new(),
        outdir: args.outdir,
        tokens_dir,
    };

    for name in &names {
        pipeline.process_card(name).await?;
    }
    Ok(pipeline.finish().await)
}

/// Which failure list a download reports into.
#[derive(Debug, Clone, Copy)]
enum Namespace {
    Card,
    Token,
}

struct Pipeline {
    outdir: PathBuf,
    tokens_dir: PathBuf,
    resolver: PrintingResolver,
    expander: Option<TokenExpander>,
    downloader: Arc<ImageDownloader>,
    report: Arc<FailureReport>,
    semaphore: Arc<Semaphore>,
    downloads: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Resolves one card and queues downloads for its printings and, when
    /// enabled, its tokens. Resolution failures are recorded and the run
    /// moves on; only filesystem trouble is worth stopping for.
    async fn process_card(&mut self, name: &CardName) -> std::io::Result<()> {
        info!("{}", name);
        let card_dir = self.outdir.join(name.as_str());
        ensure_dir(&card_dir)?;

        let mut stream = match self.resolver.resolve(name).await {
            Ok(stream) => stream,
            Err(failure) => {
                error!("    No results found!");
                self.report
                    .record_card_failure(&failure.name, &failure.reason);
                return Ok(());
            }
        };

        let tokens = match &self.expander {
            Some(expander) => expander.expand(name, &self.report).await,
            None => Vec::new(),
        };
        // One dedup pass spans all of this card's token streams.
        let mut token_deduper = PrintingDeduper::new();
        for mut token in tokens {
            let token_dir = self.tokens_dir.join(&token.name);
            ensure_dir(&token_dir)?;
            let owner = token.name.clone();
            self.drain_stream(
                &mut token.stream,
                &mut token_deduper,
                token_dir,
                &owner,
                Namespace::Token,
            )
            .await;
        }

        let mut deduper = PrintingDeduper::new();
        self.drain_stream(&mut stream, &mut deduper, card_dir, name.as_str(), Namespace::Card)
            .await;
        Ok(())
    }

    /// Walks one deduplicated stream in order, handing each printing to the
    /// bounded download pool.
    async fn drain_stream(
        &mut self,
        stream: &mut PrintingStream,
        deduper: &mut PrintingDeduper,
        dir: PathBuf,
        owner: &str,
        namespace: Namespace,
    ) {
        loop {
            let printing = match deduper.next(stream).await {
                Ok(Some(printing)) => printing,
                Ok(None) => return,
                Err(e) => {
                    // The rest of this result set is unreachable; printings
                    // already handed to the pool are unaffected.
                    error!("    Lost the result pages for '{}': {}", owner, e);
                    self.record(namespace, owner, &format!("pagination failed: {}", e));
                    return;
                }
            };

            let downloader = Arc::clone(&self.downloader);
            let report = Arc::clone(&self.report);
            let semaphore = Arc::clone(&self.semaphore);
            let dir = dir.clone();
            let owner = owner.to_string();

            self.downloads.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return, // pool closed, run is shutting down
                };

                let label = printing.label();
                let prefix = match namespace {
                    Namespace::Card => "",
                    Namespace::Token => "Token: ",
                };
                match downloader.download(&printing, &dir).await {
                    Ok(DownloadOutcome::Saved(file_name)) => info!("    {}{}", prefix, file_name),
                    Ok(DownloadOutcome::AlreadyPresent) => info!("    {}(already there)", prefix),
                    Ok(DownloadOutcome::NoArtwork) => info!(">>> Skipping {}", label),
                    Err(e) => {
                        error!("    {}{} failed: {}", prefix, label, e);
                        match namespace {
                            Namespace::Card => {
                                report.record_card_failure(&owner, &format!("{}: {}", label, e))
                            }
                            Namespace::Token => {
                                report.record_token_failure(&owner, &format!("{}: {}", label, e))
                            }
                        }
                    }
                }
            }));
        }
    }

    fn record(&self, namespace: Namespace, owner: &str, reason: &str) {
        match namespace {
            Namespace::Card => self.report.record_card_failure(owner, reason),
            Namespace::Token => self.report.record_token_failure(owner, reason),
        }
    }

    /// Waits out the download pool, then renders the final report.
    async fn finish(self) -> i32 {
        join_all(self.downloads).await;
        self.report.finish()
    }
}
