use chrono::{DateTime, Utc};

/// Abbreviate with K/M/B/T suffixes and at most one decimal (`1500 -> 1.5K`, `50 -> 50`).
pub fn abbreviate_number(value: f64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let mut v = value.abs();
    if v < 1000.0 {
        return format!("{sign}{}", trim_decimal(v));
    }

    let mut tier = 0usize;
    while v >= 1000.0 && tier < SUFFIXES.len() - 1 {
        v /= 1000.0;
        tier += 1;
    }
    let mut rounded = (v * 10.0).round() / 10.0;
    if rounded >= 1000.0 && tier < SUFFIXES.len() - 1 {
        rounded = ((rounded / 1000.0) * 10.0).round() / 10.0;
        tier += 1;
    }
    format!("{sign}{}{}", trim_decimal(rounded), SUFFIXES[tier])
}

fn trim_decimal(v: f64) -> String {
    let r = (v * 10.0).round() / 10.0;
    if r.fract() == 0.0 {
        format!("{}", r as i64)
    } else {
        format!("{r:.1}")
    }
}

/// Creation date text: the custom date when given (verbatim, or formatted when it parses as
/// RFC 3339), else the account timestamp; empty when neither is available.
pub fn date_text(custom: Option<&str>, created_ms: Option<i64>, locale: Option<&str>) -> String {
    if let Some(custom) = custom {
        return match DateTime::parse_from_rfc3339(custom.trim()) {
            Ok(dt) => format_date(&dt.with_timezone(&Utc), locale),
            Err(_) => custom.to_owned(),
        };
    }
    created_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| format_date(&dt, locale))
        .unwrap_or_default()
}

/// Short date in a locale-shaped pattern (`en` style by default: `Mar 5, 2020`).
pub fn format_date(dt: &DateTime<Utc>, locale: Option<&str>) -> String {
    let lang = locale
        .unwrap_or("en-US")
        .split(['-', '_'])
        .next()
        .unwrap_or("en")
        .to_ascii_lowercase();
    let pattern = match lang.as_str() {
        "en" => "%b %-d, %Y",
        "ja" | "zh" | "ko" => "%Y/%m/%d",
        "de" | "ru" | "pl" | "tr" => "%d.%m.%Y",
        _ => "%d/%m/%Y",
    };
    dt.format(pattern).to_string()
}

/// Cut `text` to `max` chars, marking the cut with `...`.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations() {
        assert_eq!(abbreviate_number(50.0), "50");
        assert_eq!(abbreviate_number(999.0), "999");
        assert_eq!(abbreviate_number(1000.0), "1K");
        assert_eq!(abbreviate_number(1500.0), "1.5K");
        assert_eq!(abbreviate_number(1_250_000.0), "1.3M");
        assert_eq!(abbreviate_number(999_999.0), "1M");
        assert_eq!(abbreviate_number(2_000_000_000.0), "2B");
        assert_eq!(abbreviate_number(-1500.0), "-1.5K");
        assert_eq!(abbreviate_number(12.34), "12.3");
    }

    #[test]
    fn dates_by_locale() {
        let ms = 1_583_366_400_000; // 2020-03-05T00:00:00Z
        assert_eq!(date_text(None, Some(ms), None), "Mar 5, 2020");
        assert_eq!(date_text(None, Some(ms), Some("ja-JP")), "2020/03/05");
        assert_eq!(date_text(None, Some(ms), Some("fr-FR")), "05/03/2020");
        assert_eq!(date_text(None, Some(ms), Some("de")), "05.03.2020");
        assert_eq!(date_text(None, None, None), "");
    }

    #[test]
    fn custom_date_verbatim_or_parsed() {
        assert_eq!(date_text(Some("since forever"), Some(0), None), "since forever");
        assert_eq!(
            date_text(Some("2021-12-24T10:00:00Z"), None, Some("en-GB")),
            "Dec 24, 2021"
        );
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_text("short", 30), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
    }
}
