//! Turns a finished draft into a creation request and maps the outcome to the
//! inline messages shown by the dialog.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, macros::time, Date};
use tokio_util::sync::CancellationToken;

use super::entities::{BookingType, EntityId, ImageFile, ListingId, ReservationType};
use super::wizard::{ListingKind, WizardState, REQUIRED_IMAGES};

/// Delay between the success message and the dialog closing.
pub const CLOSE_DELAY: Duration = Duration::from_secs(2);

pub const MSG_PUBLISHED: &str = "Annonce publiée avec succès !";
pub const MSG_UNAUTHENTICATED: &str = "Vous devez être connecté pour publier une annonce.";
pub const MSG_GENERIC: &str = "Une erreur est survenue lors de la publication. Veuillez réessayer.";

/// Draft problems caught right before sending.
#[derive(Debug, Error, PartialEq)]
pub enum SubmissionError {
    #[error("Ajoutez exactement 2 photos (actuellement {found}).")]
    MissingImages { found: usize },
    #[error("Sélectionnez l'aéroport de {0}.")]
    MissingAirport(&'static str),
    #[error("Sélectionnez une devise.")]
    MissingCurrency,
    #[error("Indiquez la date du voyage.")]
    MissingTravelDate,
    #[error("Date de voyage invalide.")]
    InvalidTravelDate,
}

/// Failure reported by the creation endpoint.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("rejected: {}", .0.join(", "))]
    Rejected(Vec<String>),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ListingGateway: Send + Sync {
    async fn create_listing(&self, payload: ListingPayload) -> Result<ListingId, GatewayError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListingPayload {
    pub kind: ListingKind,
    pub description: String,
    pub flight_number: String,
    pub departure_airport_id: EntityId,
    pub arrival_airport_id: EntityId,
    pub currency_id: Option<EntityId>,
    /// RFC 3339 timestamp of the departure.
    pub departure_datetime: String,
    pub weight_kg: f64,
    pub price_per_kg: f64,
    pub late_fee: f64,
    pub no_smile_fee: f64,
    pub allow_extra_weight: bool,
    pub reservation_type: ReservationType,
    pub booking_type: BookingType,
    pub images: Vec<ImageFile>,
}

impl ListingPayload {
    /// Text parts of the multipart body, using the endpoint's field names.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("flightNumber", self.flight_number.clone()),
            ("departureAirportId", self.departure_airport_id.to_string()),
            ("arrivalAirportId", self.arrival_airport_id.to_string()),
            ("departureDatetime", self.departure_datetime.clone()),
        ];
        if let Some(currency_id) = self.currency_id {
            fields.push(("currencyId", currency_id.to_string()));
        }

        match self.kind {
            ListingKind::Travel => {
                fields.extend([
                    ("description", self.description.clone()),
                    ("totalWeightAllowance", number(self.weight_kg)),
                    ("pricePerKg", number(self.price_per_kg)),
                    ("lateFee", number(self.late_fee)),
                    ("noSmileFee", number(self.no_smile_fee)),
                    ("allowExtraWeight", self.allow_extra_weight.to_string()),
                    ("reservationType", self.reservation_type.as_str().to_string()),
                    ("isInstant", self.booking_type.is_instant().to_string()),
                ]);
            }
            ListingKind::Package => {
                fields.extend([
                    ("baggageDescription", self.description.clone()),
                    ("weight", number(self.weight_kg)),
                    ("pricePerKilo", number(self.price_per_kg)),
                ]);
            }
        }
        fields
    }
}

fn number(value: f64) -> String {
    value.to_string()
}

/// Builds the request payload, re-checking what the step gates already enforce.
pub fn prepare(kind: ListingKind, state: &WizardState) -> Result<ListingPayload, SubmissionError> {
    if state.images.len() != REQUIRED_IMAGES {
        return Err(SubmissionError::MissingImages {
            found: state.images.len(),
        });
    }
    let departure = state
        .departure_airport
        .as_ref()
        .ok_or(SubmissionError::MissingAirport("départ"))?;
    let arrival = state
        .arrival_airport
        .as_ref()
        .ok_or(SubmissionError::MissingAirport("arrivée"))?;
    let currency_id = state.currency.as_ref().map(|currency| currency.id);
    if kind == ListingKind::Travel && currency_id.is_none() {
        return Err(SubmissionError::MissingCurrency);
    }
    let date = state.travel_date.ok_or(SubmissionError::MissingTravelDate)?;

    let description = match kind {
        ListingKind::Travel => state.description.trim().to_string(),
        ListingKind::Package => state.baggage_description.trim().to_string(),
    };

    Ok(ListingPayload {
        kind,
        description,
        flight_number: state.display_flight_number(),
        departure_airport_id: departure.id,
        arrival_airport_id: arrival.id,
        currency_id,
        departure_datetime: midday_timestamp(date)?,
        weight_kg: state.weight_kg(),
        price_per_kg: state.price_per_kg(),
        late_fee: state.late_fee(),
        no_smile_fee: state.no_smile_fee(),
        allow_extra_weight: state.allow_extra_weight,
        reservation_type: state.reservation_type,
        booking_type: state.booking_type,
        images: state.images.iter().map(|staged| staged.file.clone()).collect(),
    })
}

/// The form only captures a date; departures are sent at 12:00 UTC.
pub fn midday_timestamp(date: Date) -> Result<String, SubmissionError> {
    date.with_time(time!(12:00))
        .assume_utc()
        .format(&Rfc3339)
        .map_err(|_| SubmissionError::InvalidTravelDate)
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome {
    Published(ListingId),
    Failed(String),
    /// The dialog went away before the answer arrived.
    Discarded,
}

/// Sends the payload. Cancelling `cancel` drops the request and discards the result.
pub async fn submit<G>(gateway: &G, payload: ListingPayload, cancel: &CancellationToken) -> SubmissionOutcome
where
    G: ListingGateway + ?Sized,
{
    if cancel.is_cancelled() {
        return SubmissionOutcome::Discarded;
    }
    let kind = payload.kind;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(?kind, "submission cancelled before completion");
            SubmissionOutcome::Discarded
        }
        result = gateway.create_listing(payload) => match result {
            Ok(id) => {
                tracing::info!(?kind, listing_id = %id, "listing published");
                SubmissionOutcome::Published(id)
            }
            Err(error) => SubmissionOutcome::Failed(failure_message(&error)),
        }
    }
}

/// Waits [`CLOSE_DELAY`] after a successful publish. Returns `true` when the
/// dialog should close, `false` when `cycle` ended in the meantime.
pub async fn close_after_success(cycle: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cycle.cancelled() => false,
        _ = tokio::time::sleep(CLOSE_DELAY) => !cycle.is_cancelled(),
    }
}

pub fn failure_message(error: &GatewayError) -> String {
    match error {
        GatewayError::Unauthorized => MSG_UNAUTHENTICATED.to_string(),
        GatewayError::Rejected(messages) if !messages.is_empty() => messages.join(", "),
        other => {
            tracing::error!(error = %other, "listing creation failed");
            MSG_GENERIC.to_string()
        }
    }
}

/// Inline status shown at the bottom of the dialog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionStatus {
    pub submitting: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl SubmissionStatus {
    /// Returns `false` while a request is in flight or once the listing is published.
    pub fn begin(&mut self) -> bool {
        if !self.can_publish() {
            return false;
        }
        self.submitting = true;
        self.error = None;
        self.success = None;
        true
    }

    /// A published draft stays locked until the dialog is reopened.
    pub fn can_publish(&self) -> bool {
        !self.submitting && self.success.is_none()
    }

    pub fn reject(&mut self, error: &SubmissionError) {
        self.submitting = false;
        self.error = Some(error.to_string());
    }

    /// Records the outcome; returns `true` when the dialog should close after [`CLOSE_DELAY`].
    pub fn finish(&mut self, outcome: &SubmissionOutcome) -> bool {
        self.submitting = false;
        match outcome {
            SubmissionOutcome::Published(_) => {
                self.success = Some(MSG_PUBLISHED.to_string());
                true
            }
            SubmissionOutcome::Failed(message) => {
                self.error = Some(message.clone());
                false
            }
            SubmissionOutcome::Discarded => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use time::macros::date;

    use super::*;
    use crate::domain::entities::{Airport, Currency};
    use crate::domain::wizard::{WizardController, WizardStep};

    struct FakeGateway {
        calls: AtomicUsize,
        last: Mutex<Option<ListingPayload>>,
        reply: Result<ListingId, GatewayError>,
        delay: Duration,
    }

    impl FakeGateway {
        fn replying(reply: Result<ListingId, GatewayError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ListingGateway for FakeGateway {
        async fn create_listing(&self, payload: ListingPayload) -> Result<ListingId, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(payload);
            tokio::time::sleep(self.delay).await;
            self.reply.clone()
        }
    }

    fn airport(id: i64, code: &str) -> Airport {
        Airport {
            id,
            code: code.into(),
            name: code.into(),
            city: None,
            country: None,
        }
    }

    fn eur() -> Currency {
        Currency {
            id: 978,
            code: "EUR".into(),
            name: "Euro".into(),
            symbol: "€".into(),
            country: None,
        }
    }

    fn photo(name: &str) -> ImageFile {
        ImageFile::new(name, "image/jpeg", vec![0xff, 0xd8])
    }

    fn filled_travel() -> WizardController {
        let mut wizard = WizardController::new(ListingKind::Travel);
        wizard.open(None);
        {
            let state = wizard.state_mut();
            state.departure_airport = Some(airport(11, "CDG"));
            state.arrival_airport = Some(airport(22, "DSS"));
            state.flight_number = "af718".into();
            state.travel_date = Some(date!(2026 - 11 - 20));
        }
        assert!(wizard.go_next());
        wizard.add_images(vec![photo("front.jpg"), photo("side.jpg")]);
        assert!(wizard.go_next());
        {
            let state = wizard.state_mut();
            state.weight_input = "8".into();
            state.price_input = "15".into();
            state.currency = Some(eur());
        }
        assert!(wizard.go_next());
        assert_eq!(wizard.active_step(), WizardStep::Payments);
        wizard
    }

    #[test]
    fn timestamp_is_midday_utc() {
        assert_eq!(
            midday_timestamp(date!(2026 - 03 - 09)).unwrap(),
            "2026-03-09T12:00:00Z"
        );
    }

    #[test]
    fn prepare_rechecks_images_and_airports() {
        let mut wizard = filled_travel();
        wizard.remove_image(1);
        assert_eq!(
            prepare(ListingKind::Travel, wizard.state()),
            Err(SubmissionError::MissingImages { found: 1 })
        );

        wizard.add_image(photo("again.jpg"));
        wizard.state_mut().arrival_airport = None;
        assert_eq!(
            prepare(ListingKind::Travel, wizard.state()),
            Err(SubmissionError::MissingAirport("arrivée"))
        );
    }

    #[test]
    fn package_payload_uses_package_field_names() {
        let mut wizard = WizardController::new(ListingKind::Package);
        wizard.open(None);
        {
            let state = wizard.state_mut();
            state.departure_airport = Some(airport(1, "ORY"));
            state.arrival_airport = Some(airport(2, "TUN"));
            state.baggage_description = " Two books ".into();
            state.weight_input = "abc".into();
            state.price_input = "4,5".into();
            state.travel_date = Some(date!(2026 - 12 - 24));
        }
        wizard.add_images(vec![photo("a.jpg"), photo("b.jpg")]);
        let payload = prepare(ListingKind::Package, wizard.state()).unwrap();
        let fields = payload.form_fields();
        assert!(fields.contains(&("baggageDescription", "Two books".to_string())));
        assert!(fields.contains(&("weight", "0".to_string())));
        assert!(fields.contains(&("pricePerKilo", "4.5".to_string())));
        assert!(!fields.iter().any(|(name, _)| *name == "currencyId"));
    }

    #[test]
    fn unauthorized_maps_to_login_message() {
        let mut status = SubmissionStatus::default();
        assert!(status.begin());
        let outcome = SubmissionOutcome::Failed(failure_message(&GatewayError::Unauthorized));
        assert!(!status.finish(&outcome));
        assert_eq!(status.error.as_deref(), Some(MSG_UNAUTHENTICATED));
        assert!(!status.submitting);
    }

    #[test]
    fn server_messages_are_joined() {
        let error = GatewayError::Rejected(vec![
            "weight must be positive".into(),
            "flightNumber is required".into(),
        ]);
        assert_eq!(
            failure_message(&error),
            "weight must be positive, flightNumber is required"
        );
        assert_eq!(failure_message(&GatewayError::Rejected(vec![])), MSG_GENERIC);
        assert_eq!(failure_message(&GatewayError::Other("boom".into())), MSG_GENERIC);
    }

    #[test]
    fn double_submit_is_refused() {
        let mut status = SubmissionStatus::default();
        assert!(status.begin());
        assert!(!status.begin());
    }

    #[test]
    fn published_status_stays_locked_until_cleared() {
        let mut status = SubmissionStatus::default();
        assert!(status.begin());
        assert!(status.finish(&SubmissionOutcome::Published(ListingId("lst_1".into()))));
        assert!(!status.submitting);
        assert!(!status.begin());
        status.clear();
        assert!(status.begin());
    }

    #[test]
    fn failed_publish_can_be_retried() {
        let mut status = SubmissionStatus::default();
        assert!(status.begin());
        assert!(!status.finish(&SubmissionOutcome::Failed(MSG_GENERIC.into())));
        assert!(status.can_publish());
        assert!(status.begin());
        assert!(status.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_close_is_skipped_when_the_cycle_ends() {
        let mut wizard = filled_travel();
        let cycle = wizard.cycle_token();
        let started = tokio::time::Instant::now();

        let (close, _) = tokio::join!(close_after_success(&cycle), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            wizard.close();
        });

        assert!(!close);
        assert_eq!(started.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn travel_wizard_publishes_and_closes() {
        let gateway = FakeGateway::replying(Ok(ListingId("lst_42".into())));
        let mut wizard = filled_travel();
        let mut status = SubmissionStatus::default();

        let payload = prepare(wizard.kind(), wizard.state()).unwrap();
        assert!(status.begin());
        let outcome = submit(&gateway, payload, &wizard.cycle_token()).await;
        assert_eq!(outcome, SubmissionOutcome::Published(ListingId("lst_42".into())));
        assert!(status.finish(&outcome));
        assert_eq!(status.success.as_deref(), Some(MSG_PUBLISHED));

        assert!(!status.begin());
        assert!(!status.can_publish());

        let started = tokio::time::Instant::now();
        assert!(close_after_success(&wizard.cycle_token()).await);
        assert_eq!(started.elapsed(), CLOSE_DELAY);
        wizard.close();
        assert!(!wizard.is_open());

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        let sent = gateway.last.lock().unwrap().clone().unwrap();
        let fields = sent.form_fields();
        assert!(fields.contains(&("totalWeightAllowance", "8".to_string())));
        assert!(fields.contains(&("pricePerKg", "15".to_string())));
        assert!(fields.contains(&("currencyId", "978".to_string())));
        assert!(fields.contains(&("flightNumber", "AF718".to_string())));
        assert!(fields.contains(&("departureDatetime", "2026-11-20T12:00:00Z".to_string())));
        assert_eq!(sent.images.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_dialog_discards_the_answer() {
        let mut gateway = FakeGateway::replying(Ok(ListingId("late".into())));
        gateway.delay = Duration::from_secs(5);
        let mut wizard = filled_travel();
        let payload = prepare(wizard.kind(), wizard.state()).unwrap();
        let token = wizard.cycle_token();

        let (outcome, _) = tokio::join!(submit(&gateway, payload, &token), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            wizard.close();
        });

        assert_eq!(outcome, SubmissionOutcome::Discarded);
        let mut status = SubmissionStatus::default();
        status.begin();
        assert!(!status.finish(&outcome));
        assert!(status.success.is_none() && status.error.is_none());
    }
}
