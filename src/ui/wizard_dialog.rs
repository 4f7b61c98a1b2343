use std::path::Path;

use dioxus::prelude::*;

use bagspace::domain::{
    lookup::resolve_airline,
    submission::{self, close_after_success},
    wizard::{format_form_date, parse_form_date},
    Airport, AppState, BackOutcome, BookingType, Currency, ImageFile, LatestOnly, ListingKind,
    PricingBreakdown, ReservationType, SubmissionOutcome, SubmissionStatus, WizardController,
    WizardStep,
};
use bagspace::infra::api::ApiClient;

use crate::ui::components::{
    lookup_fields::{AirportField, CurrencyField},
    pricing_summary::PricingSummary,
    toast::{push_toast, ToastKind, ToastMessage},
};

/// Render-time snapshot of the draft, so the controller is not borrowed while building nodes.
struct DialogView {
    step: WizardStep,
    position: u8,
    can_advance: bool,
    is_last: bool,
    missing: Vec<&'static str>,
    departure: Option<Airport>,
    arrival: Option<Airport>,
    flight_number: String,
    airline: Option<String>,
    travel_date: String,
    description: String,
    description_remaining: i64,
    baggage_description: String,
    /// Index, file name and preview handle of each staged image.
    images: Vec<(usize, String, String)>,
    weight_input: String,
    price_input: String,
    currency: Option<Currency>,
    late_fee_input: String,
    no_smile_fee_input: String,
    allow_extra_weight: bool,
    reservation_type: ReservationType,
    booking_type: BookingType,
    pricing: PricingBreakdown,
}

impl From<&WizardController> for DialogView {
    fn from(wizard: &WizardController) -> Self {
        let state = wizard.state();
        Self {
            step: wizard.active_step(),
            position: wizard.current_step(),
            can_advance: wizard.can_advance(),
            is_last: wizard.is_last_step(),
            missing: wizard.missing_fields(),
            departure: state.departure_airport.clone(),
            arrival: state.arrival_airport.clone(),
            flight_number: state.display_flight_number(),
            airline: state.airline.as_ref().map(|airline| airline.name.clone()),
            travel_date: state.travel_date.map(format_form_date).unwrap_or_default(),
            description: state.description.clone(),
            description_remaining: state.description_remaining(),
            baggage_description: state.baggage_description.clone(),
            images: state
                .images
                .iter()
                .enumerate()
                .map(|(idx, staged)| {
                    (idx, staged.file.file_name.clone(), staged.preview.as_str().to_string())
                })
                .collect(),
            weight_input: state.weight_input.clone(),
            price_input: state.price_input.clone(),
            currency: state.currency.clone(),
            late_fee_input: state.late_fee_input.clone(),
            no_smile_fee_input: state.no_smile_fee_input.clone(),
            allow_extra_weight: state.allow_extra_weight,
            reservation_type: state.reservation_type,
            booking_type: state.booking_type,
            pricing: state.pricing(),
        }
    }
}

#[component]
pub fn ListingWizardDialog(kind: ListingKind, open: Signal<bool>) -> Element {
    let client = use_context::<ApiClient>();
    let app_state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();

    let mut open = open;
    let mut wizard = use_signal(move || WizardController::new(kind));
    let mut status = use_signal(SubmissionStatus::default);
    let mut image_path = use_signal(String::new);
    let airline_guard = use_hook(LatestOnly::default);

    use_effect({
        let airline_guard = airline_guard.clone();
        move || {
            let should_be_open = open();
            let is_open = wizard.peek().is_open();
            if should_be_open && !is_open {
                wizard.with_mut(|w| w.open(None));
                status.set(SubmissionStatus::default());
            } else if !should_be_open && is_open {
                wizard.with_mut(|w| w.close());
                airline_guard.invalidate();
            }
        }
    });

    if !open() {
        return rsx! {};
    }

    let view = wizard.with(|w| DialogView::from(w));
    let current_status = status();

    let on_flight_input = {
        let client = client.clone();
        move |evt: FormEvent| {
            let value = evt.value();
            wizard.with_mut(|w| {
                let state = w.state_mut();
                state.flight_number = value.clone();
                state.airline = None;
            });
            let client = client.clone();
            let guard = airline_guard.clone();
            let cycle = wizard.with(|w| w.cycle_token());
            spawn(async move {
                let mut wizard = wizard;
                match resolve_airline(&client, &guard, &cycle, &value).await {
                    Some(Ok(airline)) => wizard.with_mut(|w| w.state_mut().airline = airline),
                    Some(Err(err)) => tracing::warn!(%err, "airline lookup failed"),
                    None => {}
                }
            });
        }
    };

    let on_add_image = move |_| {
        let path = image_path().trim().to_string();
        if path.is_empty() {
            return;
        }
        spawn(async move {
            let mut wizard = wizard;
            let mut image_path = image_path;
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let name = Path::new(&path)
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    let added =
                        wizard.with_mut(|w| w.add_image(ImageFile::from_path_bytes(name, bytes)));
                    if added {
                        image_path.set(String::new());
                    } else {
                        push_toast(toasts, ToastKind::Warning, "Deux photos maximum.");
                    }
                }
                Err(err) => {
                    tracing::warn!(%path, %err, "could not read image");
                    push_toast(toasts, ToastKind::Error, format!("Impossible de lire {path} : {err}"));
                }
            }
        });
    };

    let on_publish = {
        let client = client.clone();
        move |_| {
            if !status.with_mut(|s| s.begin()) {
                return;
            }
            let (prepared, token) =
                wizard.with(|w| (submission::prepare(w.kind(), w.state()), w.cycle_token()));
            let payload = match prepared {
                Ok(payload) => payload,
                Err(err) => {
                    status.with_mut(|s| s.reject(&err));
                    return;
                }
            };
            let gateway =
                client.with_token(app_state.with(|s| s.bearer_token().map(str::to_string)));
            spawn(async move {
                let mut status = status;
                let mut open = open;
                let outcome = submission::submit(&gateway, payload, &token).await;
                if outcome == SubmissionOutcome::Discarded {
                    return;
                }
                if status.with_mut(|s| s.finish(&outcome)) {
                    push_toast(toasts, ToastKind::Success, submission::MSG_PUBLISHED);
                    if close_after_success(&token).await {
                        open.set(false);
                    }
                }
            });
        }
    };

    let hint = if view.missing.is_empty() {
        String::new()
    } else {
        format!("À compléter : {}", view.missing.join(", "))
    };
    let publish_label = if current_status.submitting {
        "Publication…"
    } else {
        "Publier"
    };

    rsx! {
        div { class: "wizard-backdrop",
            div { class: "wizard-dialog",
                h2 { "{kind.title()}" }
                ol { class: "wizard-steps",
                    for (idx, step) in kind.steps().iter().enumerate() {
                        li {
                            key: "{idx}",
                            class: if idx + 1 == view.position as usize { "wizard-step-active" } else { "" },
                            "{idx + 1}. {step.title()}"
                        }
                    }
                }

                match view.step {
                    WizardStep::Airports => rsx! {
                        AirportField {
                            label: "Aéroport de départ",
                            selected: view.departure.clone(),
                            on_select: move |airport| wizard.with_mut(|w| w.state_mut().departure_airport = Some(airport)),
                        }
                        AirportField {
                            label: "Aéroport d'arrivée",
                            selected: view.arrival.clone(),
                            on_select: move |airport| wizard.with_mut(|w| w.state_mut().arrival_airport = Some(airport)),
                        }
                        div { class: "wizard-field",
                            label { "Numéro de vol" }
                            input { r#type: "text", value: "{view.flight_number}", oninput: on_flight_input }
                            if let Some(airline) = view.airline.as_ref() {
                                span { class: "wizard-hint", "{airline}" }
                            }
                        }
                        div { class: "wizard-field",
                            label { "Date du voyage" }
                            input {
                                r#type: "date",
                                value: "{view.travel_date}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().travel_date = parse_form_date(&evt.value())),
                            }
                        }
                        div { class: "wizard-field",
                            label { "Description" }
                            textarea {
                                value: "{view.description}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().description = evt.value()),
                            }
                            span { class: "wizard-hint", "{view.description_remaining} caractères restants" }
                        }
                    },
                    WizardStep::Details => rsx! {
                        AirportField {
                            label: "Aéroport de départ",
                            selected: view.departure.clone(),
                            on_select: move |airport| wizard.with_mut(|w| w.state_mut().departure_airport = Some(airport)),
                        }
                        AirportField {
                            label: "Aéroport d'arrivée",
                            selected: view.arrival.clone(),
                            on_select: move |airport| wizard.with_mut(|w| w.state_mut().arrival_airport = Some(airport)),
                        }
                        div { class: "wizard-field",
                            label { "Contenu du colis" }
                            textarea {
                                value: "{view.baggage_description}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().baggage_description = evt.value()),
                            }
                        }
                    },
                    WizardStep::Photos => rsx! {
                        div { class: "wizard-field",
                            label { "Photos ({view.images.len()}/2)" }
                            input {
                                r#type: "text",
                                placeholder: "Chemin du fichier image",
                                value: "{image_path}",
                                oninput: move |evt: FormEvent| image_path.set(evt.value()),
                            }
                            button {
                                class: "btn",
                                disabled: view.images.len() >= 2,
                                onclick: on_add_image,
                                "Ajouter"
                            }
                        }
                        ul { class: "wizard-photos",
                            for (idx, name, preview) in view.images.clone() {
                                li { key: "{preview}",
                                    span { "{name}" }
                                    button {
                                        class: "btn",
                                        onclick: move |_| {
                                            wizard.with_mut(|w| w.remove_image(idx));
                                        },
                                        "Retirer"
                                    }
                                }
                            }
                        }
                    },
                    WizardStep::PriceWeight => rsx! {
                        div { class: "wizard-field",
                            label { "Poids disponible (kg)" }
                            input {
                                r#type: "number",
                                min: "0",
                                value: "{view.weight_input}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().weight_input = evt.value()),
                            }
                        }
                        div { class: "wizard-field",
                            label { "Prix par kg" }
                            input {
                                r#type: "number",
                                min: "0",
                                value: "{view.price_input}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().price_input = evt.value()),
                            }
                        }
                        CurrencyField {
                            selected: view.currency.clone(),
                            on_select: move |currency| wizard.with_mut(|w| w.state_mut().currency = Some(currency)),
                        }
                        PricingSummary { breakdown: view.pricing, currency: view.currency.clone() }
                    },
                    WizardStep::Shipment => rsx! {
                        div { class: "wizard-field",
                            label { "Poids (kg)" }
                            input {
                                r#type: "number",
                                min: "0",
                                value: "{view.weight_input}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().weight_input = evt.value()),
                            }
                        }
                        div { class: "wizard-field",
                            label { "Prix par kilo" }
                            input {
                                r#type: "number",
                                min: "0",
                                value: "{view.price_input}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().price_input = evt.value()),
                            }
                        }
                        div { class: "wizard-field",
                            label { "Numéro de vol" }
                            input { r#type: "text", value: "{view.flight_number}", oninput: on_flight_input }
                            if let Some(airline) = view.airline.as_ref() {
                                span { class: "wizard-hint", "{airline}" }
                            }
                        }
                        div { class: "wizard-field",
                            label { "Date du voyage" }
                            input {
                                r#type: "date",
                                value: "{view.travel_date}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().travel_date = parse_form_date(&evt.value())),
                            }
                        }
                        PricingSummary { breakdown: view.pricing, currency: view.currency.clone() }
                    },
                    WizardStep::Payments => rsx! {
                        div { class: "wizard-field",
                            label { "Frais de retard" }
                            input {
                                r#type: "number",
                                min: "0",
                                value: "{view.late_fee_input}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().late_fee_input = evt.value()),
                            }
                        }
                        div { class: "wizard-field",
                            label { "Frais « no smile »" }
                            input {
                                r#type: "number",
                                min: "0",
                                value: "{view.no_smile_fee_input}",
                                oninput: move |evt: FormEvent| wizard.with_mut(|w| w.state_mut().no_smile_fee_input = evt.value()),
                            }
                        }
                        div { class: "wizard-field",
                            button {
                                class: "btn",
                                onclick: move |_| wizard.with_mut(|w| {
                                    let state = w.state_mut();
                                    state.allow_extra_weight = !state.allow_extra_weight;
                                }),
                                if view.allow_extra_weight { "☑ Poids supplémentaire accepté" } else { "☐ Poids supplémentaire accepté" }
                            }
                        }
                        div { class: "wizard-field",
                            label { "Type de réservation" }
                            select {
                                value: "{view.reservation_type.as_str()}",
                                onchange: move |evt: FormEvent| {
                                    let value = if evt.value() == "shared" { ReservationType::Shared } else { ReservationType::Single };
                                    wizard.with_mut(|w| w.state_mut().reservation_type = value);
                                },
                                option { value: "single", "Individuelle" }
                                option { value: "shared", "Partagée" }
                            }
                        }
                        div { class: "wizard-field",
                            label { "Réservation" }
                            select {
                                value: "{view.booking_type.as_str()}",
                                onchange: move |evt: FormEvent| {
                                    let value = if evt.value() == "non-instant" { BookingType::NonInstant } else { BookingType::Instant };
                                    wizard.with_mut(|w| w.state_mut().booking_type = value);
                                },
                                option { value: "instant", "Instantanée" }
                                option { value: "non-instant", "Sur validation" }
                            }
                        }
                        PricingSummary { breakdown: view.pricing, currency: view.currency.clone() }
                    },
                }

                if !hint.is_empty() {
                    p { class: "wizard-hint", "{hint}" }
                }
                if let Some(error) = current_status.error.as_ref() {
                    p { class: "wizard-error", "{error}" }
                }
                if let Some(success) = current_status.success.as_ref() {
                    p { class: "wizard-success", "{success}" }
                }

                div { class: "wizard-footer",
                    div {
                        button {
                            class: "btn",
                            onclick: move |_| {
                                if wizard.with_mut(|w| w.go_back()) == BackOutcome::CloseRequested {
                                    open.set(false);
                                }
                            },
                            if view.position > 1 { "Retour" } else { "Annuler" }
                        }
                        button {
                            class: "btn",
                            onclick: move |_| wizard.with(|w| w.save_unfinished()),
                            "Enregistrer comme brouillon"
                        }
                    }
                    if view.is_last {
                        button {
                            class: "btn btn-primary",
                            disabled: !current_status.can_publish() || !view.can_advance,
                            onclick: on_publish,
                            "{publish_label}"
                        }
                    } else {
                        button {
                            class: "btn btn-primary",
                            disabled: !view.can_advance,
                            onclick: move |_| {
                                wizard.with_mut(|w| w.go_next());
                            },
                            "Suivant"
                        }
                    }
                }
            }
        }
    }
}
