//! Draft state and step navigation for the listing creation wizards.

use time::{macros::format_description, Date};
use tokio_util::sync::CancellationToken;

use super::entities::{Airline, Airport, BookingType, Currency, ImageFile, ReservationType};
use super::previews::{PreviewRegistry, PreviewUrl};
use super::pricing::{self, PricingBreakdown};
use super::validation;

/// Photos a listing must carry; also the upload cap.
pub const REQUIRED_IMAGES: usize = 2;
/// Soft limit shown under the description field.
pub const DESCRIPTION_SOFT_LIMIT: usize = 500;

/// Parses the `YYYY-MM-DD` value of a date input. Empty or malformed input reads as no date.
pub fn parse_form_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_form_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingKind {
    /// A traveler offering spare luggage space.
    Travel,
    /// A sender looking for space for a package.
    Package,
}

impl ListingKind {
    pub fn steps(&self) -> &'static [WizardStep] {
        match self {
            ListingKind::Travel => &[
                WizardStep::Airports,
                WizardStep::Photos,
                WizardStep::PriceWeight,
                WizardStep::Payments,
            ],
            ListingKind::Package => &[
                WizardStep::Details,
                WizardStep::Photos,
                WizardStep::Shipment,
            ],
        }
    }

    pub fn max_step(&self) -> u8 {
        self.steps().len() as u8
    }

    /// Step at a 1-based position, clamped to the wizard's range.
    pub fn step_at(&self, position: u8) -> WizardStep {
        let steps = self.steps();
        let index = (position.max(1) as usize - 1).min(steps.len() - 1);
        steps[index]
    }

    pub fn title(&self) -> &'static str {
        match self {
            ListingKind::Travel => "Publier un voyage",
            ListingKind::Package => "Envoyer un colis",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WizardStep {
    Airports,
    Photos,
    PriceWeight,
    Payments,
    Details,
    Shipment,
}

impl WizardStep {
    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Airports => "Aéroports",
            WizardStep::Photos => "Photos",
            WizardStep::PriceWeight => "Prix et poids",
            WizardStep::Payments => "Paiements",
            WizardStep::Details => "Détails du colis",
            WizardStep::Shipment => "Expédition",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StagedImage {
    pub file: ImageFile,
    pub preview: PreviewUrl,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WizardState {
    /// 1-based position in the wizard.
    pub current_step: u8,
    pub departure_airport: Option<Airport>,
    pub arrival_airport: Option<Airport>,
    pub flight_number: String,
    pub airline: Option<Airline>,
    pub travel_date: Option<Date>,
    pub description: String,
    pub baggage_description: String,
    pub images: Vec<StagedImage>,
    pub weight_input: String,
    pub price_input: String,
    pub currency: Option<Currency>,
    pub late_fee_input: String,
    pub no_smile_fee_input: String,
    pub allow_extra_weight: bool,
    pub reservation_type: ReservationType,
    pub booking_type: BookingType,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: 1,
            departure_airport: None,
            arrival_airport: None,
            flight_number: String::new(),
            airline: None,
            travel_date: None,
            description: String::new(),
            baggage_description: String::new(),
            images: Vec::new(),
            weight_input: String::new(),
            price_input: String::new(),
            currency: None,
            late_fee_input: "0".to_string(),
            no_smile_fee_input: "0".to_string(),
            allow_extra_weight: false,
            reservation_type: ReservationType::Single,
            booking_type: BookingType::Instant,
        }
    }
}

impl WizardState {
    pub fn weight_kg(&self) -> f64 {
        pricing::parse_amount(&self.weight_input)
    }

    pub fn price_per_kg(&self) -> f64 {
        pricing::parse_amount(&self.price_input)
    }

    pub fn late_fee(&self) -> f64 {
        pricing::parse_amount(&self.late_fee_input)
    }

    pub fn no_smile_fee(&self) -> f64 {
        pricing::parse_amount(&self.no_smile_fee_input)
    }

    pub fn display_flight_number(&self) -> String {
        self.flight_number.trim().to_uppercase()
    }

    /// Characters left before the soft limit; negative once exceeded.
    pub fn description_remaining(&self) -> i64 {
        DESCRIPTION_SOFT_LIMIT as i64 - self.description.chars().count() as i64
    }

    pub fn pricing(&self) -> PricingBreakdown {
        pricing::breakdown(self.weight_kg(), self.price_per_kg())
    }
}

/// Values used to pre-fill a wizard, e.g. when duplicating an existing listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingSeed {
    pub departure_airport: Option<Airport>,
    pub arrival_airport: Option<Airport>,
    pub flight_number: Option<String>,
    pub travel_date: Option<Date>,
    pub description: Option<String>,
    pub baggage_description: Option<String>,
    pub weight_kg: Option<f64>,
    pub price_per_kg: Option<f64>,
    pub currency: Option<Currency>,
    pub late_fee: Option<f64>,
    pub no_smile_fee: Option<f64>,
    pub allow_extra_weight: Option<bool>,
    pub reservation_type: Option<ReservationType>,
    pub booking_type: Option<BookingType>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackOutcome {
    Retreated,
    CloseRequested,
}

/// Owns one draft for the lifetime of an open dialog.
#[derive(Debug)]
pub struct WizardController {
    kind: ListingKind,
    state: WizardState,
    previews: PreviewRegistry,
    is_open: bool,
    seeded: bool,
    cycle: CancellationToken,
}

impl WizardController {
    pub fn new(kind: ListingKind) -> Self {
        Self {
            kind,
            state: WizardState::default(),
            previews: PreviewRegistry::default(),
            is_open: false,
            seeded: false,
            cycle: CancellationToken::new(),
        }
    }

    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Field access for input handlers. Step and images are managed by the controller.
    pub fn state_mut(&mut self) -> &mut WizardState {
        &mut self.state
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn current_step(&self) -> u8 {
        self.state.current_step
    }

    pub fn active_step(&self) -> WizardStep {
        self.kind.step_at(self.state.current_step)
    }

    pub fn is_last_step(&self) -> bool {
        self.state.current_step >= self.kind.max_step()
    }

    pub fn can_advance(&self) -> bool {
        validation::step_is_valid(self.kind, self.active_step(), &self.state)
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        validation::missing_fields(self.kind, self.active_step(), &self.state)
    }

    /// Token cancelled when the current open/close cycle ends.
    pub fn cycle_token(&self) -> CancellationToken {
        self.cycle.clone()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Starts an open/close cycle. Without a seed the draft is reset to defaults.
    pub fn open(&mut self, seed: Option<ListingSeed>) {
        if self.is_open {
            tracing::debug!(kind = ?self.kind, "wizard already open");
            return;
        }
        self.reset();
        self.is_open = true;
        self.seeded = false;
        self.cycle = CancellationToken::new();
        if let Some(seed) = seed {
            self.seed(seed);
        }
        tracing::info!(kind = ?self.kind, seeded = self.seeded, "wizard opened");
    }

    /// Ends the cycle: pending work is cancelled and the draft is discarded.
    pub fn close(&mut self) {
        self.cycle.cancel();
        self.reset();
        self.is_open = false;
        self.seeded = false;
        tracing::info!(kind = ?self.kind, "wizard closed");
    }

    pub fn reset(&mut self) {
        let released = self.previews.release_all();
        if released > 0 {
            tracing::debug!(released, "released image previews on reset");
        }
        self.state = WizardState::default();
    }

    /// Applies seed values once per cycle. Returns `false` when already seeded.
    pub fn seed(&mut self, seed: ListingSeed) -> bool {
        if self.seeded {
            return false;
        }
        self.seeded = true;

        let state = &mut self.state;
        state.departure_airport = seed.departure_airport;
        state.arrival_airport = seed.arrival_airport;
        state.travel_date = seed.travel_date;
        state.currency = seed.currency;
        if let Some(value) = seed.flight_number {
            state.flight_number = value;
        }
        if let Some(value) = seed.description {
            state.description = value;
        }
        if let Some(value) = seed.baggage_description {
            state.baggage_description = value;
        }
        if let Some(value) = seed.weight_kg {
            state.weight_input = value.to_string();
        }
        if let Some(value) = seed.price_per_kg {
            state.price_input = value.to_string();
        }
        if let Some(value) = seed.late_fee {
            state.late_fee_input = value.to_string();
        }
        if let Some(value) = seed.no_smile_fee {
            state.no_smile_fee_input = value.to_string();
        }
        if let Some(value) = seed.allow_extra_weight {
            state.allow_extra_weight = value;
        }
        if let Some(value) = seed.reservation_type {
            state.reservation_type = value;
        }
        if let Some(value) = seed.booking_type {
            state.booking_type = value;
        }
        true
    }

    pub fn go_next(&mut self) -> bool {
        if self.is_last_step() || !self.can_advance() {
            return false;
        }
        self.state.current_step += 1;
        tracing::debug!(step = self.state.current_step, "wizard advanced");
        true
    }

    pub fn go_back(&mut self) -> BackOutcome {
        if self.state.current_step > 1 {
            self.state.current_step -= 1;
            BackOutcome::Retreated
        } else {
            self.close();
            BackOutcome::CloseRequested
        }
    }

    /// Stages a picked image. Files beyond the cap are refused.
    pub fn add_image(&mut self, file: ImageFile) -> bool {
        if self.state.images.len() >= REQUIRED_IMAGES {
            tracing::debug!(file = %file.file_name, "image cap reached, ignoring file");
            return false;
        }
        let preview = self.previews.acquire();
        self.state.images.push(StagedImage { file, preview });
        true
    }

    /// Stages files in order until the cap is reached. Returns how many were kept.
    pub fn add_images(&mut self, files: impl IntoIterator<Item = ImageFile>) -> usize {
        files
            .into_iter()
            .map(|file| self.add_image(file))
            .filter(|added| *added)
            .count()
    }

    pub fn remove_image(&mut self, index: usize) -> Option<ImageFile> {
        if index >= self.state.images.len() {
            return None;
        }
        let staged = self.state.images.remove(index);
        self.previews.release(&staged.preview);
        Some(staged.file)
    }

    /// Draft saving is not backed by any storage yet.
    pub fn save_unfinished(&self) {
        tracing::info!(kind = ?self.kind, step = self.state.current_step, "save as unfinished requested; drafts are not persisted");
    }
}

impl Drop for WizardController {
    fn drop(&mut self) {
        self.cycle.cancel();
        self.previews.release_all();
    }
}
