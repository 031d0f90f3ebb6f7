use std::sync::{Mutex, PoisonError};

use log::error;

/// One failed card or token, with the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub name: String,
    pub reason: String,
}

impl Failure {
    fn new(name: &str, reason: &str) -> Self {
        Failure {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Run-wide failure accounting. Card and token failures live in separate
/// lists so token trouble never masquerades as a deck problem. Appends are
/// mutex-guarded since download tasks report concurrently.
#[derive(Debug, Default)]
pub struct FailureReport {
    cards: Mutex<Vec<Failure>>,
    tokens: Mutex<Vec<Failure>>,
}

impl FailureReport {
    pub fn new() -> Self {
        FailureReport::default()
    }

    pub fn record_card_failure(&self, name: &str, reason: &str) {
        self.cards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Failure::new(name, reason));
    }

    pub fn record_token_failure(&self, name: &str, reason: &str) {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Failure::new(name, reason));
    }

    pub fn card_failures(&self) -> Vec<Failure> {
        self.cards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token_failures(&self) -> Vec<Failure> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Renders both failure lists (cards first) to the error stream and picks
    /// the process exit code: non-zero as soon as anything failed.
    pub fn finish(&self) -> i32 {
        let cards = self.card_failures();
        let tokens = self.token_failures();

        if !cards.is_empty() {
            error!("Failed to download the following cards:");
            for failure in &cards {
                error!("    {} ({})", failure.name, failure.reason);
            }
        }
        if !tokens.is_empty() {
            error!("Failed to download the following tokens:");
            for failure in &tokens {
                error!("    {} ({})", failure.name, failure.reason);
            }
        }

        if cards.is_empty() && tokens.is_empty() {
            0
        } else {
            1
        }
    }
}
