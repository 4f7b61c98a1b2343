//! Cost breakdown shown next to the price and weight inputs.

use super::entities::Currency;

/// VAT applied on top of the weight subtotal.
pub const VAT_RATE: f64 = 0.24;
/// Flat fee charged by the platform on every listing.
pub const PLATFORM_FEE: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PricingBreakdown {
    pub subtotal: f64,
    pub vat: f64,
    pub platform_fee: f64,
    pub total: f64,
}

/// Breakdown for a listing with the standard platform fee.
pub fn breakdown(weight_kg: f64, price_per_kg: f64) -> PricingBreakdown {
    booking_breakdown(weight_kg, price_per_kg, PLATFORM_FEE)
}

/// Breakdown used by the booking confirmation, where the platform tax is
/// supplied by the listing instead of the constant fee.
pub fn booking_breakdown(weight_kg: f64, price_per_kg: f64, platform_tax: f64) -> PricingBreakdown {
    let subtotal = sanitize(weight_kg) * sanitize(price_per_kg);
    let vat = subtotal * VAT_RATE;
    let platform_fee = sanitize(platform_tax);
    let total = (subtotal + vat + platform_fee).max(0.0);

    PricingBreakdown {
        subtotal,
        vat,
        platform_fee,
        total,
    }
}

/// Parses a numeric form input. Blank, non-finite or negative values read as 0.
pub fn parse_amount(raw: &str) -> f64 {
    let normalized = raw.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .map(sanitize)
        .unwrap_or_default()
}

pub fn format_money(amount: f64, currency: Option<&Currency>) -> String {
    match currency {
        Some(currency) => format!("{amount:.2} {}", currency.symbol),
        None => format!("{amount:.2}"),
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn five_kilos_at_ten() {
        let b = breakdown(5.0, 10.0);
        assert!(approx(b.subtotal, 50.0));
        assert!(approx(b.vat, 12.0));
        assert!(approx(b.platform_fee, 10.0));
        assert!(approx(b.total, 72.0));
    }

    #[test]
    fn empty_inputs_still_carry_the_fee() {
        let b = breakdown(0.0, 0.0);
        assert_eq!(b.subtotal, 0.0);
        assert_eq!(b.total, PLATFORM_FEE);
    }

    #[test]
    fn booking_uses_listing_tax() {
        let b = booking_breakdown(2.0, 20.0, 4.5);
        assert!(approx(b.total, 40.0 + 9.6 + 4.5));
        assert!(approx(booking_breakdown(1.0, 1.0, -50.0).total, 1.24));
    }

    #[test]
    fn amounts_parse_leniently() {
        assert_eq!(parse_amount("12,5"), 12.5);
        assert_eq!(parse_amount("  8 "), 8.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("-3"), 0.0);
    }

    #[test]
    fn money_is_two_decimals() {
        let eur = Currency {
            id: 1,
            code: "EUR".into(),
            name: "Euro".into(),
            symbol: "€".into(),
            country: None,
        };
        assert_eq!(format_money(72.0, Some(&eur)), "72.00 €");
        assert_eq!(format_money(3.456, None), "3.46");
    }
}
