//! Debounced autocomplete inputs for airports and currencies.

use dioxus::prelude::*;

use bagspace::domain::{lookup::SEARCH_DEBOUNCE, Airport, Currency, LatestOnly};
use bagspace::infra::api::ApiClient;

const MIN_QUERY_LEN: usize = 2;

#[component]
pub fn AirportField(
    label: &'static str,
    selected: Option<Airport>,
    on_select: EventHandler<Airport>,
) -> Element {
    let client = use_context::<ApiClient>();
    let mut query = use_signal(String::new);
    let mut suggestions = use_signal(Vec::<Airport>::new);
    let guard = use_hook(LatestOnly::default);

    let on_input = move |evt: FormEvent| {
        let text = evt.value();
        query.set(text.clone());
        if text.trim().chars().count() < MIN_QUERY_LEN {
            guard.invalidate();
            suggestions.set(Vec::new());
            return;
        }
        let client = client.clone();
        let guard = guard.clone();
        spawn(async move {
            let result = guard
                .debounced(SEARCH_DEBOUNCE, || async { client.search_airports(&text).await })
                .await;
            match result {
                Some(Ok(found)) => suggestions.set(found),
                Some(Err(err)) => tracing::warn!(%err, "airport search failed"),
                None => {}
            }
        });
    };

    let items: Vec<(Airport, String)> = suggestions()
        .into_iter()
        .map(|airport| {
            let text = airport.label();
            (airport, text)
        })
        .collect();
    let current = selected.map(|airport| airport.label()).unwrap_or_default();

    rsx! {
        div { class: "wizard-field",
            label { "{label}" }
            if !current.is_empty() {
                span { class: "wizard-hint", "{current}" }
            }
            input {
                r#type: "text",
                placeholder: "Ville ou code IATA",
                value: "{query}",
                oninput: on_input,
            }
            if !items.is_empty() {
                ul { class: "wizard-suggestions",
                    for (airport, text) in items {
                        li {
                            key: "{text}",
                            onclick: move |_| {
                                on_select.call(airport.clone());
                                query.set(String::new());
                                suggestions.set(Vec::new());
                            },
                            "{text}"
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn CurrencyField(selected: Option<Currency>, on_select: EventHandler<Currency>) -> Element {
    let client = use_context::<ApiClient>();
    let mut query = use_signal(String::new);
    let mut suggestions = use_signal(Vec::<Currency>::new);
    let guard = use_hook(LatestOnly::default);

    let on_input = move |evt: FormEvent| {
        let text = evt.value();
        query.set(text.clone());
        if text.trim().is_empty() {
            guard.invalidate();
            suggestions.set(Vec::new());
            return;
        }
        let client = client.clone();
        let guard = guard.clone();
        spawn(async move {
            let result = guard
                .debounced(SEARCH_DEBOUNCE, || async { client.search_currencies(&text).await })
                .await;
            match result {
                Some(Ok(found)) => suggestions.set(found),
                Some(Err(err)) => tracing::warn!(%err, "currency search failed"),
                None => {}
            }
        });
    };

    let items: Vec<(Currency, String)> = suggestions()
        .into_iter()
        .map(|currency| {
            let text = format!("{} ({}) · {}", currency.code, currency.symbol, currency.name);
            (currency, text)
        })
        .collect();
    let current = selected
        .map(|currency| format!("{} ({})", currency.code, currency.symbol))
        .unwrap_or_default();

    rsx! {
        div { class: "wizard-field",
            label { "Devise" }
            if !current.is_empty() {
                span { class: "wizard-hint", "{current}" }
            }
            input {
                r#type: "text",
                placeholder: "EUR, XOF, USD…",
                value: "{query}",
                oninput: on_input,
            }
            if !items.is_empty() {
                ul { class: "wizard-suggestions",
                    for (currency, text) in items {
                        li {
                            key: "{text}",
                            onclick: move |_| {
                                on_select.call(currency.clone());
                                query.set(String::new());
                                suggestions.set(Vec::new());
                            },
                            "{text}"
                        }
                    }
                }
            }
        }
    }
}
