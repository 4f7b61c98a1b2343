//! Listing drafts, step gates, pricing and submission live here.

pub mod app_state;
pub mod entities;
pub mod lookup;
pub mod previews;
pub mod pricing;
pub mod submission;
pub mod validation;
pub mod wizard;

pub use app_state::{AppState, PersistedState, Session, Theme};
pub use entities::{
    Airline, Airport, BookingType, Currency, EntityId, ImageFile, ListingId, ReservationType,
};
pub use lookup::{LatestOnly, LookupError, LookupService};
pub use pricing::{booking_breakdown, breakdown, PricingBreakdown};
pub use submission::{
    GatewayError, ListingGateway, ListingPayload, SubmissionError, SubmissionOutcome,
    SubmissionStatus,
};
pub use wizard::{BackOutcome, ListingKind, ListingSeed, WizardController, WizardState, WizardStep};
