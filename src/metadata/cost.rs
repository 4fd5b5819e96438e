//! Query cost estimate from bytes scanned.

use crate::config::PricingConfig;
use serde::Serialize;

/// Bytes per pricing terabyte (binary, 2^40).
pub const BYTES_PER_TB: f64 = 1_099_511_627_776.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub usd: f64,
    pub secondary: f64,
    /// ISO code of `secondary`, e.g. "KRW".
    pub secondary_currency: String,
}

/// `None` unless something was scanned.
pub fn estimate_cost(data_scanned_bytes: Option<f64>, pricing: &PricingConfig) -> Option<CostEstimate> {
    let bytes = data_scanned_bytes.filter(|b| b.is_finite() && *b > 0.0)?;
    let usd = (bytes / BYTES_PER_TB) * pricing.price_per_tb_usd * pricing.overhead_multiplier;
    Some(CostEstimate {
        usd,
        secondary: usd * pricing.secondary_rate,
        secondary_currency: pricing.secondary_currency.clone(),
    })
}

/// `"$5.50 (₩7,700)"`
pub fn format_cost(cost: &CostEstimate, pricing: &PricingConfig) -> String {
    format!(
        "${:.2} ({})",
        cost.usd,
        format_secondary(cost.secondary, pricing)
    )
}

/// Grouping and symbol placement of the locales we know about.
struct LocaleStyle {
    group: char,
    symbol_after: bool,
}

fn locale_style(locale: &str) -> Option<LocaleStyle> {
    match locale {
        "ko-KR" | "en-US" | "en-GB" | "ja-JP" | "zh-CN" | "zh-TW" => Some(LocaleStyle {
            group: ',',
            symbol_after: false,
        }),
        "de-DE" | "id-ID" | "es-ES" | "it-IT" => Some(LocaleStyle {
            group: '.',
            symbol_after: true,
        }),
        "fr-FR" => Some(LocaleStyle {
            group: '\u{202f}',
            symbol_after: true,
        }),
        _ => None,
    }
}

/// Secondary currency with zero fraction digits, in the configured locale when
/// known, else `<symbol><comma-grouped integer>`.
pub fn format_secondary(amount: f64, pricing: &PricingConfig) -> String {
    let rounded = amount.max(0.0).round() as u64;
    let symbol = pricing.secondary_symbol.as_str();
    match locale_style(&pricing.locale) {
        Some(style) if style.symbol_after => {
            format!("{}\u{a0}{symbol}", group_thousands(rounded, style.group))
        }
        Some(style) => format!("{symbol}{}", group_thousands(rounded, style.group)),
        None => format!("{symbol}{}", group_thousands(rounded, ',')),
    }
}

pub fn group_thousands(n: u64, sep: char) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
