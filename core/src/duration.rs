//! Parsing of short duration strings such as `30m` or `1h30m`, used by the
//! front-ends for "updated since" filters.

use std::time::Duration;

use crate::error::{Error, Result};

/// Parse a sequence of `<number><unit>` terms. Units: `ns`, `us`, `µs`,
/// `ms`, `s`, `m`, `h`. Fractions are allowed (`1.5h`).
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || {
        Error::invalid_parameter(format!(
            "invalid duration format: {input}. Use formats like 10s, 30m, 24h"
        ))
    };

    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds_per_unit = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];
        total += value * seconds_per_unit;
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}
