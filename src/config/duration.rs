// src/config/duration.rs

//! Delay parsing.
//!
//! Delays are written either as a bare integer (milliseconds) or as a
//! duration string made of one or more `<number><unit>` terms, e.g. `"500ms"`,
//! `"1.5s"` or `"1m30s"`. Supported units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

fn term_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h)").expect("static duration regex")
    })
}

pub fn parse_delay(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Duration::ZERO);
    }

    // Bare integers are milliseconds.
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    let mut total_nanos = 0f64;
    let mut consumed = 0;
    for caps in term_regex().captures_iter(s) {
        let whole = caps.get(0).expect("group 0 always present");
        if whole.start() != consumed {
            return Err(format!("invalid duration '{s}'"));
        }
        consumed = whole.end();

        let value: f64 = caps[1]
            .parse()
            .map_err(|e| format!("invalid duration number '{}': {}", &caps[1], e))?;
        let unit_nanos = match &caps[2] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            other => return Err(format!("unsupported duration unit '{other}'")),
        };
        total_nanos += value * unit_nanos;
    }

    if consumed == 0 || consumed != s.len() {
        return Err(format!(
            "invalid duration '{s}'; expected milliseconds or a value like 500ms, 1.5s, 1m30s"
        ));
    }

    if total_nanos >= u64::MAX as f64 {
        return Err(format!("duration '{s}' is too large"));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}
