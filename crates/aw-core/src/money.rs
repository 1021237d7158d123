//! Micro-amount formatting.

const MICROS_PER_CENT: i64 = 10_000;

/// Convert a micro amount to a currency string with at most two decimals,
/// trailing zeros dropped (`1_500_000` → `"1.5"`, `2_000_000` → `"2"`).
/// Half-way values round to even cents.
pub fn micros_to_currency(micros: i64) -> String {
    let negative = micros < 0;
    let abs = micros.unsigned_abs();
    let per_cent = MICROS_PER_CENT as u64;
    let mut cents = abs / per_cent;
    let rem = abs % per_cent;
    let half = per_cent / 2;
    if rem > half || (rem == half && cents % 2 == 1) {
        cents += 1;
    }

    let whole = cents / 100;
    let frac = cents % 100;
    let mut out = String::new();
    if negative && cents != 0 {
        out.push('-');
    }
    out.push_str(&whole.to_string());
    if frac != 0 {
        let digits = format!("{frac:02}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}
