/// Decode an upstream exchange-rate string into a USD price.
///
/// Upstream mixes two encodings with no discriminating flag: stablecoin-style
/// rates already denominated in USD, and rates scaled down by 1e8. The value
/// itself disambiguates: anything >= 1 is taken as USD verbatim, anything
/// below 1 is `USD / 1e8` and gets multiplied back up. The boundary value 1
/// takes the already-USD branch. This rule must not change without both
/// upstreams changing their encodings.
pub fn price_to_usd(raw: &str) -> f64 {
    let Ok(value) = raw.trim().parse::<f64>() else {
        return 0.0;
    };
    if value <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    if value >= 1.0 { value } else { value * 1e8 }
}
