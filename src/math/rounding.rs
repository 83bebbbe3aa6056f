//! Rounding helpers with half-up tie behavior.
//!
//! `f64::round` rounds ties away from zero and `format!("{:.2}")` rounds exact
//! binary ties to even. Discrete band bounds round half-up; displayed figures
//! round the stored value and push exact ties away from zero.

/// Round to the nearest integer, ties toward positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Nearest integer as `i64`, ties toward positive infinity.
pub fn round_to_i64(value: f64) -> i64 {
    round_half_up(value) as i64
}

/// Render `value` with exactly `decimals` fractional digits.
///
/// The exact binary value is rounded, so `0.15` (stored just below the tie)
/// renders as `0.1`. Only values that sit exactly on a tie round away from
/// zero.
pub fn to_fixed(value: f64, decimals: u32) -> String {
    let prec = decimals as usize;
    let rendered = if is_exact_tie(value, decimals) {
        let magnitude = value.abs() * 10f64.powi(decimals as i32);
        let digits = format!("{:0>width$}", magnitude.floor() as u64 + 1, width = prec + 1);
        let (int_part, frac_part) = digits.split_at(digits.len() - prec);
        let sign = if value < 0.0 { "-" } else { "" };
        if prec == 0 {
            format!("{sign}{int_part}")
        } else {
            format!("{sign}{int_part}.{frac_part}")
        }
    } else {
        format!("{value:.prec$}")
    };
    // Avoid printing "-0.0".
    match rendered.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => rendered,
    }
}

/// True when the decimal expansion of `value` ends in a `5` exactly one digit
/// past `decimals`.
fn is_exact_tie(value: f64, decimals: u32) -> bool {
    if !value.is_finite() || decimals > 15 {
        return false;
    }
    // A terminating expansion of at most `decimals + 1` digits needs
    // `value * 2^(decimals + 1)` to be integral; the power-of-two scale is exact.
    let dyadic = value * 2f64.powi(decimals as i32 + 1);
    if dyadic.fract() != 0.0 {
        return false;
    }
    format!("{:.*}", decimals as usize + 1, value).ends_with('5')
}
