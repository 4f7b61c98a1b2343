//! Gate predicates for each wizard step.
//!
//! Numeric fields are checked as finite and strictly positive: a weight or price
//! of zero keeps the step closed.

use super::wizard::{ListingKind, WizardState, WizardStep, REQUIRED_IMAGES};

/// Whether the user may leave `step` going forward.
pub fn step_is_valid(kind: ListingKind, step: WizardStep, state: &WizardState) -> bool {
    missing_fields(kind, step, state).is_empty()
}

/// Names of the fields that keep `step` closed, in form order.
pub fn missing_fields(kind: ListingKind, step: WizardStep, state: &WizardState) -> Vec<&'static str> {
    let mut missing = Vec::new();

    match (kind, step) {
        (ListingKind::Travel, WizardStep::Airports) => {
            require_airports(state, &mut missing);
        }
        (ListingKind::Package, WizardStep::Details) => {
            require_airports(state, &mut missing);
            if is_blank(&state.baggage_description) {
                missing.push("baggage description");
            }
        }
        (_, WizardStep::Photos) => {
            if state.images.len() < REQUIRED_IMAGES {
                missing.push("photos");
            }
        }
        (ListingKind::Travel, WizardStep::PriceWeight) => {
            require_amounts(state, &mut missing);
        }
        (ListingKind::Package, WizardStep::Shipment) => {
            require_amounts(state, &mut missing);
            if is_blank(&state.flight_number) {
                missing.push("flight number");
            }
            if state.travel_date.is_none() {
                missing.push("travel date");
            }
        }
        (ListingKind::Travel, WizardStep::Payments) => {}
        (kind, step) => {
            tracing::warn!(?kind, ?step, "step does not belong to this wizard");
            missing.push("step");
        }
    }

    missing
}

pub fn is_positive_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn require_airports(state: &WizardState, missing: &mut Vec<&'static str>) {
    if state.departure_airport.is_none() {
        missing.push("departure airport");
    }
    if state.arrival_airport.is_none() {
        missing.push("arrival airport");
    }
}

fn require_amounts(state: &WizardState, missing: &mut Vec<&'static str>) {
    if !is_positive_amount(state.weight_kg()) {
        missing.push("weight");
    }
    if !is_positive_amount(state.price_per_kg()) {
        missing.push("price per kg");
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::domain::entities::{Airport, ImageFile};
    use crate::domain::previews::PreviewRegistry;
    use crate::domain::wizard::StagedImage;

    fn airport(id: i64, code: &str) -> Airport {
        Airport {
            id,
            code: code.into(),
            name: format!("{code} airport"),
            city: None,
            country: None,
        }
    }

    fn with_images(state: &mut WizardState, count: usize) {
        let mut previews = PreviewRegistry::default();
        for idx in 0..count {
            state.images.push(StagedImage {
                file: ImageFile::new(format!("{idx}.jpg"), "image/jpeg", vec![idx as u8]),
                preview: previews.acquire(),
            });
        }
    }

    #[test]
    fn airports_step_needs_both_ends() {
        let mut state = WizardState::default();
        assert!(!step_is_valid(ListingKind::Travel, WizardStep::Airports, &state));
        state.departure_airport = Some(airport(1, "CDG"));
        assert_eq!(
            missing_fields(ListingKind::Travel, WizardStep::Airports, &state),
            vec!["arrival airport"]
        );
        state.arrival_airport = Some(airport(2, "DSS"));
        assert!(step_is_valid(ListingKind::Travel, WizardStep::Airports, &state));
    }

    #[test]
    fn photos_step_needs_two_images() {
        let mut state = WizardState::default();
        with_images(&mut state, 1);
        assert!(!step_is_valid(ListingKind::Travel, WizardStep::Photos, &state));
        with_images(&mut state, 1);
        assert!(step_is_valid(ListingKind::Travel, WizardStep::Photos, &state));
        assert!(step_is_valid(ListingKind::Package, WizardStep::Photos, &state));
    }

    #[test]
    fn zero_weight_keeps_price_step_closed() {
        let mut state = WizardState::default();
        state.weight_input = "0".into();
        state.price_input = "10".into();
        assert!(!step_is_valid(ListingKind::Travel, WizardStep::PriceWeight, &state));
        state.weight_input = "0.5".into();
        assert!(step_is_valid(ListingKind::Travel, WizardStep::PriceWeight, &state));
    }

    #[test]
    fn payments_step_is_always_open() {
        assert!(step_is_valid(
            ListingKind::Travel,
            WizardStep::Payments,
            &WizardState::default()
        ));
    }

    #[test]
    fn package_steps_require_text_fields() {
        let mut state = WizardState::default();
        state.departure_airport = Some(airport(1, "CDG"));
        state.arrival_airport = Some(airport(2, "DSS"));
        state.baggage_description = "   ".into();
        assert_eq!(
            missing_fields(ListingKind::Package, WizardStep::Details, &state),
            vec!["baggage description"]
        );
        state.baggage_description = "Two books".into();
        assert!(step_is_valid(ListingKind::Package, WizardStep::Details, &state));

        state.weight_input = "3".into();
        state.price_input = "7".into();
        assert_eq!(
            missing_fields(ListingKind::Package, WizardStep::Shipment, &state),
            vec!["flight number", "travel date"]
        );
        state.flight_number = "af718".into();
        state.travel_date = Some(date!(2026 - 11 - 02));
        assert!(step_is_valid(ListingKind::Package, WizardStep::Shipment, &state));
    }

    #[test]
    fn foreign_step_never_validates() {
        let state = WizardState::default();
        assert!(!step_is_valid(ListingKind::Package, WizardStep::Payments, &state));
    }
}
