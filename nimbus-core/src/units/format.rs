//! Locale- and capability-aware rendering of unit values.
//!
//! Three formatting tiers, tried in order:
//! 1. modern locale formatter: grouped digits, narrow no-break space
//!    before the unit name; requires an ICU unit handle, and per-unit
//!    composites additionally require `supports_per_unit`.
//! 2. legacy measure format: same name resolution, no digit grouping.
//! 3. manual template: number and unit name joined by the nominative
//!    template, with RTL wrapping for right-to-left locales.
//!
//! Formatting never fails for non-NaN input; missing capability only
//! degrades which tier is used.

use super::WeatherUnit;

/// Formatting width, mirroring the narrow/short/long distinction of the
/// per-unit precision triples and name tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitWidth {
    Narrow,
    Short,
    Long,
}

/// Explicit capability flags replacing platform-version checks, so the
/// tier fallback is testable without simulating platform versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingCapabilities {
    pub has_modern_formatter: bool,
    pub has_legacy_measure_format: bool,
    /// Composite "per" units (mm/h) need a materially newer formatter
    /// than simple units; tracked as its own flag.
    pub supports_per_unit: bool,
}

impl FormattingCapabilities {
    pub const MODERN: Self = Self {
        has_modern_formatter: true,
        has_legacy_measure_format: true,
        supports_per_unit: true,
    };

    pub const LEGACY: Self = Self {
        has_modern_formatter: false,
        has_legacy_measure_format: true,
        supports_per_unit: false,
    };

    pub const NONE: Self = Self {
        has_modern_formatter: false,
        has_legacy_measure_format: false,
        supports_per_unit: false,
    };
}

/// Language + region pair, as supplied by the out-of-scope settings layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub language: String,
    pub region: String,
}

impl Locale {
    pub fn new(language: &str, region: &str) -> Self {
        Self {
            language: language.to_lowercase(),
            region: region.to_uppercase(),
        }
    }

    pub fn english() -> Self {
        Self::new("en", "US")
    }

    fn decimal_separator(&self) -> char {
        match self.language.as_str() {
            "de" | "fr" | "es" | "it" | "pt" | "ru" | "nl" | "pl" | "uk" | "tr" => ',',
            _ => '.',
        }
    }

    fn grouping_separator(&self) -> Option<char> {
        match self.language.as_str() {
            "de" | "es" | "it" | "pt" | "nl" | "tr" => Some('.'),
            "fr" | "ru" | "uk" | "pl" => Some('\u{202F}'),
            _ => Some(','),
        }
    }

    fn is_rtl(&self) -> bool {
        matches!(self.language.as_str(), "ar" | "he" | "fa" | "ur")
    }

    /// Traditional-Chinese market regions where short/narrow unit names
    /// deliberately fall back to invariant English. The upstream zh-Hant
    /// translations were judged visually incorrect at these widths; the
    /// exact region list must not be widened or narrowed.
    fn uses_english_unit_names(&self, width: UnitWidth) -> bool {
        width != UnitWidth::Long
            && self.language.starts_with("zh")
            && matches!(self.region.as_str(), "TW" | "HK" | "MO")
    }
}

/// Resolve the display name for a unit, honoring the Traditional-Chinese
/// region override.
pub fn resolve_unit_name<U: WeatherUnit>(unit: U, locale: &Locale, width: UnitWidth) -> &'static str {
    if locale.uses_english_unit_names(width) {
        unit.name(&Locale::english(), width)
    } else {
        unit.name(locale, width)
    }
}

/// Fixed-decimals rendering with integral collapse: a value that is exact
/// in the display unit never shows a trailing zero-only fraction
/// (`5.0` renders as `5`).
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let rendered = format!("{value:.decimals$}");
    match rendered.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole.to_string(),
        _ => rendered,
    }
}

/// Locale-aware number rendering. `grouped` inserts the locale's thousands
/// separator (modern tier only). `show_sign` forces a leading `+` on
/// positive values; without it no sign is ever introduced.
pub fn format_number(
    value: f64,
    decimals: usize,
    locale: &Locale,
    grouped: bool,
    show_sign: bool,
) -> String {
    let collapsed = format_fixed(value.abs(), decimals);
    let (whole, fraction) = match collapsed.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (collapsed, None),
    };

    let whole = if grouped {
        group_digits(&whole, locale.grouping_separator())
    } else {
        whole
    };

    let mut out = String::new();
    if value < 0.0 {
        out.push('-');
    } else if show_sign && value > 0.0 {
        out.push('+');
    }
    out.push_str(&whole);
    if let Some(fraction) = fraction {
        out.push(locale.decimal_separator());
        out.push_str(&fraction);
    }
    out
}

fn group_digits(whole: &str, separator: Option<char>) -> String {
    let Some(separator) = separator else {
        return whole.to_string();
    };
    let digits: Vec<char> = whole.chars().collect();
    let mut out = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(*c);
    }
    out
}

/// Join a formatted number and a unit name using the manual nominative
/// template, wrapping with RTL marks for right-to-left locales so the
/// unit name lands on the correct side.
fn apply_template(number: &str, unit_name: &str, locale: &Locale) -> String {
    if locale.is_rtl() {
        format!("\u{200F}{number} {unit_name}\u{200F}")
    } else {
        format!("{number} {unit_name}")
    }
}

/// The formatting engine. Chooses a tier from the capability flags and
/// renders `value_in_unit` (already converted to the display unit) with
/// the unit's per-width precision.
pub fn format_unit_value<U: WeatherUnit>(
    value_in_unit: f64,
    unit: U,
    width: UnitWidth,
    locale: &Locale,
    caps: FormattingCapabilities,
    show_sign: bool,
) -> String {
    let decimals = unit.precision(width);
    let name = resolve_unit_name(unit, locale, width);

    let platform_unit_usable = unit.icu_id().is_some()
        && (!unit.is_per_composite() || caps.supports_per_unit);

    if caps.has_modern_formatter && platform_unit_usable {
        let number = format_number(value_in_unit, decimals, locale, true, show_sign);
        return format!("{number}\u{202F}{name}");
    }

    if caps.has_legacy_measure_format && unit.icu_id().is_some() && !unit.is_per_composite() {
        let number = format_number(value_in_unit, decimals, locale, false, show_sign);
        return format!("{number} {name}");
    }

    let number = format_number(value_in_unit, decimals, locale, false, show_sign);
    apply_template(&number, name, locale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{DistanceUnit, PrecipitationIntensityUnit};

    #[test]
    fn fixed_decimals_collapse_integral_values() {
        assert_eq!(format_fixed(5.0, 1), "5");
        assert_eq!(format_fixed(5.04, 1), "5.0");
        assert_eq!(format_fixed(3.10686, 1), "3.1");
        assert_eq!(format_fixed(0.0, 2), "0");
    }

    #[test]
    fn show_sign_only_adds_plus_when_requested() {
        let en = Locale::english();
        assert_eq!(format_number(2.5, 1, &en, false, true), "+2.5");
        assert_eq!(format_number(2.5, 1, &en, false, false), "2.5");
        assert_eq!(format_number(-2.5, 1, &en, false, true), "-2.5");
    }

    #[test]
    fn grouping_and_decimal_separator_follow_locale() {
        let de = Locale::new("de", "DE");
        assert_eq!(format_number(12345.5, 1, &de, true, false), "12.345,5");
        let en = Locale::english();
        assert_eq!(format_number(12345.5, 1, &en, true, false), "12,345.5");
    }

    #[test]
    fn modern_tier_used_when_capable() {
        let out = format_unit_value(
            3.1,
            DistanceUnit::Mile,
            UnitWidth::Short,
            &Locale::english(),
            FormattingCapabilities::MODERN,
            false,
        );
        assert_eq!(out, "3.1\u{202F}mi");
    }

    #[test]
    fn legacy_tier_used_without_modern_formatter() {
        let out = format_unit_value(
            3.1,
            DistanceUnit::Mile,
            UnitWidth::Short,
            &Locale::english(),
            FormattingCapabilities::LEGACY,
            false,
        );
        assert_eq!(out, "3.1 mi");
    }

    #[test]
    fn per_composite_degrades_without_per_unit_support() {
        // mm/h has an ICU handle, but composing "per hour" needs the
        // newer formatter; without it the manual template is used.
        let caps = FormattingCapabilities {
            has_modern_formatter: true,
            has_legacy_measure_format: true,
            supports_per_unit: false,
        };
        let out = format_unit_value(
            1.5,
            PrecipitationIntensityUnit::MillimeterPerHour,
            UnitWidth::Short,
            &Locale::english(),
            caps,
            false,
        );
        assert_eq!(out, "1.5 mm/h");
    }

    #[test]
    fn traditional_chinese_regions_fall_back_to_english_names() {
        let tw = Locale::new("zh", "TW");
        let short = resolve_unit_name(DistanceUnit::Kilometer, &tw, UnitWidth::Short);
        assert_eq!(short, "km");
        // Long width keeps the translated name.
        let long = resolve_unit_name(DistanceUnit::Kilometer, &tw, UnitWidth::Long);
        assert_eq!(long, "公里");
        // Mainland region is not part of the override.
        let cn = Locale::new("zh", "CN");
        assert_eq!(resolve_unit_name(DistanceUnit::Kilometer, &cn, UnitWidth::Short), "公里");
    }

    #[test]
    fn rtl_locales_wrap_manual_template() {
        let ar = Locale::new("ar", "SA");
        let out = format_unit_value(
            5.0,
            DistanceUnit::Kilometer,
            UnitWidth::Short,
            &ar,
            FormattingCapabilities::NONE,
            false,
        );
        assert!(out.starts_with('\u{200F}') && out.ends_with('\u{200F}'));
    }
}
