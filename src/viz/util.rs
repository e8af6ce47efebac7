//! Utility functions for visualization: locale mapping and tick label formatting.

use num_format::{Locale, ToFormattedString};

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator char.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'), // default
    }
}

/// Number of decimals needed to tell ticks `step` apart.
pub fn tick_precision(step: f64) -> usize {
    if step > 0.0 && step.is_finite() {
        (-step.log10().floor()).max(0.0) as usize
    } else {
        0
    }
}

/// Format a tick value with grouping separators, e.g. `2,016` or `0.5`.
pub fn format_tick(v: f64, step: f64, locale_tag: &str) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let (locale, dec_sep) = map_locale(locale_tag);
    let text = format!("{:.*}", tick_precision(step), v.abs());
    let (int_part, frac) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::new();
    // no sign on values that round to zero
    if v < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    match int_part.parse::<u128>() {
        Ok(n) => out.push_str(&n.to_formatted_string(locale)),
        Err(_) => out.push_str(int_part),
    }
    if let Some(f) = frac {
        out.push(dec_sep);
        out.push_str(f);
    }
    out
}
