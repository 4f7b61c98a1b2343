use dioxus::prelude::*;

use bagspace::domain::{pricing::format_money, Currency, PricingBreakdown};

#[component]
pub fn PricingSummary(breakdown: PricingBreakdown, currency: Option<Currency>) -> Element {
    let money = |amount: f64| format_money(amount, currency.as_ref());
    let subtotal = money(breakdown.subtotal);
    let vat = money(breakdown.vat);
    let fee = money(breakdown.platform_fee);
    let total = money(breakdown.total);

    rsx! {
        div { class: "wizard-pricing",
            span { "Sous-total" }
            span { "{subtotal}" }
            span { "TVA (24 %)" }
            span { "{vat}" }
            span { "Frais de plateforme" }
            span { "{fee}" }
            strong { "Total" }
            strong { "{total}" }
        }
    }
}
