//! Autocomplete data sources and stale-response guarding.
//!
//! All debounced lookups go through [`LatestOnly`]: each keystroke issues a
//! ticket, and only the newest ticket may apply its response.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::entities::{Airline, Airport, Currency};

/// Delay between the last keystroke and the airline lookup.
pub const AIRLINE_DEBOUNCE: Duration = Duration::from_millis(500);
/// Delay used by the airport and currency comboboxes.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// Shorter flight numbers cannot carry an airline prefix and a number.
pub const MIN_FLIGHT_QUERY_LEN: usize = 3;

#[derive(Debug, thiserror::Error)]
#[error("lookup failed: {0}")]
pub struct LookupError(pub String);

#[async_trait]
pub trait LookupService: Send + Sync {
    async fn search_airports(&self, query: &str) -> Result<Vec<Airport>, LookupError>;
    async fn search_currencies(&self, query: &str) -> Result<Vec<Currency>, LookupError>;
    async fn airline_for_flight(&self, flight_number: &str) -> Result<Option<Airline>, LookupError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LookupTicket(u64);

/// Monotonic request counter shared by one input field.
#[derive(Clone, Debug, Default)]
pub struct LatestOnly {
    generation: Arc<AtomicU64>,
}

impl LatestOnly {
    pub fn issue(&self) -> LookupTicket {
        LookupTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Makes every outstanding ticket stale, e.g. when the field is cleared.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Waits `delay`, then runs `fetch` if no newer request superseded this one.
    /// Returns `None` when the result is stale and must be dropped.
    pub async fn debounced<T, F, Fut>(&self, delay: Duration, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.issue();
        tokio::time::sleep(delay).await;
        if !self.is_current(ticket) {
            return None;
        }
        let value = fetch().await;
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!("dropping superseded lookup response");
            None
        }
    }
}

/// Uppercased flight number, or `None` when too short to look up.
pub fn normalize_flight_number(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    (normalized.chars().count() >= MIN_FLIGHT_QUERY_LEN).then_some(normalized)
}

/// Debounced airline resolution for the flight number field.
///
/// Returns `None` when a newer keystroke superseded this lookup or when the
/// wizard cycle `cycle` ended first; the caller leaves its state untouched.
pub async fn resolve_airline<S>(
    service: &S,
    guard: &LatestOnly,
    cycle: &CancellationToken,
    flight_number: &str,
) -> Option<Result<Option<Airline>, LookupError>>
where
    S: LookupService + ?Sized,
{
    if cycle.is_cancelled() {
        return None;
    }
    let Some(normalized) = normalize_flight_number(flight_number) else {
        guard.invalidate();
        return Some(Ok(None));
    };
    let lookup = guard.debounced(AIRLINE_DEBOUNCE, || async {
        service.airline_for_flight(&normalized).await
    });
    tokio::select! {
        biased;
        _ = cycle.cancelled() => {
            tracing::debug!(flight = %normalized, "wizard closed, dropping airline lookup");
            None
        }
        result = lookup => result,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::wizard::{ListingKind, WizardController};

    #[derive(Default)]
    struct RecordingLookup {
        flights: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LookupService for RecordingLookup {
        async fn search_airports(&self, _query: &str) -> Result<Vec<Airport>, LookupError> {
            Ok(Vec::new())
        }

        async fn search_currencies(&self, _query: &str) -> Result<Vec<Currency>, LookupError> {
            Ok(Vec::new())
        }

        async fn airline_for_flight(
            &self,
            flight_number: &str,
        ) -> Result<Option<Airline>, LookupError> {
            self.flights.lock().unwrap().push(flight_number.to_string());
            Ok(Some(Airline {
                name: format!("Airline for {flight_number}"),
                iata_code: Some(flight_number[..2].to_string()),
                logo_url: None,
            }))
        }
    }

    #[test]
    fn only_newest_ticket_is_current() {
        let guard = LatestOnly::default();
        let first = guard.issue();
        let second = guard.issue();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
        guard.invalidate();
        assert!(!guard.is_current(second));
    }

    #[test]
    fn flight_numbers_are_normalized() {
        assert_eq!(normalize_flight_number(" af 718 "), Some("AF718".to_string()));
        assert_eq!(normalize_flight_number("a1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_lookup_is_dropped() {
        let service = RecordingLookup::default();
        let guard = LatestOnly::default();
        let cycle = CancellationToken::new();

        let (first, second) = tokio::join!(resolve_airline(&service, &guard, &cycle, "af7"), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            resolve_airline(&service, &guard, &cycle, "af718").await
        });

        assert!(first.is_none());
        let airline = second.unwrap().unwrap().unwrap();
        assert_eq!(airline.name, "Airline for AF718");
        assert_eq!(*service.flights.lock().unwrap(), vec!["AF718".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn short_input_skips_the_call() {
        let service = RecordingLookup::default();
        let guard = LatestOnly::default();
        let result = resolve_airline(&service, &guard, &CancellationToken::new(), "a").await;
        assert!(matches!(result, Some(Ok(None))));
        assert!(service.flights.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_from_a_closed_cycle_never_reaches_the_next_draft() {
        let service = RecordingLookup::default();
        let guard = LatestOnly::default();
        let mut wizard = WizardController::new(ListingKind::Travel);
        wizard.open(None);
        let cycle = wizard.cycle_token();

        let (result, _) = tokio::join!(resolve_airline(&service, &guard, &cycle, "af718"), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            wizard.close();
            wizard.open(None);
        });

        assert!(result.is_none());
        assert!(wizard.state().airline.is_none());
        assert!(wizard.state().flight_number.is_empty());
        assert!(service.flights.lock().unwrap().is_empty());
        assert!(!wizard.cycle_token().is_cancelled());
    }
}
