//! Numeric, boolean and duration literal grammar shared by the converters and
//! the store's primitive getters.
//!
//! Integers accept an optional sign followed by a decimal, `0x` hex, `0b`
//! binary or leading-zero octal body. Underscores may separate digits.

use std::time::Duration;

/// Parses an integer literal, returning a reason on failure.
pub fn parse_integer(raw: &str) -> Result<i128, &'static str> {
    let s = raw.trim();
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if let Some(rest) = strip_prefix_ci(body, "0x") {
        (16, rest)
    } else if let Some(rest) = strip_prefix_ci(body, "0b") {
        (2, rest)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    let digits = strip_separators(digits)?;
    if digits.starts_with(['+', '-']) {
        return Err("misplaced sign");
    }
    let magnitude = i128::from_str_radix(&digits, radix).map_err(|_| match radix {
        16 => "invalid hexadecimal literal",
        8 => "invalid octal literal",
        2 => "invalid binary literal",
        _ => "invalid decimal literal",
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

pub fn parse_i32(raw: &str) -> Result<i32, &'static str> {
    i32::try_from(parse_integer(raw)?).map_err(|_| "out of range for i32")
}

pub fn parse_i64(raw: &str) -> Result<i64, &'static str> {
    i64::try_from(parse_integer(raw)?).map_err(|_| "out of range for i64")
}

/// Parses a floating point literal. Hexadecimal literals require a binary
/// exponent (`0x1.8p1`). A trailing `d` or `f` suffix is ignored.
pub fn parse_f64(raw: &str) -> Result<f64, &'static str> {
    let s = raw.trim();
    let s = s
        .strip_suffix(['d', 'D', 'f', 'F'])
        .filter(|rest| !is_hex_float(rest) || rest.contains(['p', 'P']))
        .unwrap_or(s);

    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = if let Some(hex) = strip_prefix_ci(body, "0x") {
        parse_hex_float(hex)?
    } else {
        match body {
            "NaN" => f64::NAN,
            "Infinity" => f64::INFINITY,
            _ => {
                if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                    return Err("invalid decimal literal");
                }
                let cleaned = strip_separators(body)?;
                cleaned.parse::<f64>().map_err(|_| "invalid decimal literal")?
            }
        }
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// Truthy set is `true` and `yes`, case-insensitive. Everything else is false.
pub fn parse_bool(raw: &str) -> bool {
    let s = raw.trim();
    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
}

/// Parses `<integer>[ ]<unit>`; the unit defaults to milliseconds.
pub fn parse_duration(raw: &str) -> Result<Duration, &'static str> {
    let s = raw.trim();
    let (number, unit) = s.split_at(number_end(s));
    let amount = parse_integer(number)?;
    let amount = u64::try_from(amount).map_err(|_| "duration must not be negative")?;

    let duration = match unit.trim() {
        "" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => {
            Duration::from_millis(amount)
        }
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => Duration::from_nanos(amount),
        "us" | "µs" | "micro" | "micros" | "microsecond" | "microseconds" => {
            Duration::from_micros(amount)
        }
        "s" | "second" | "seconds" => Duration::from_secs(amount),
        "m" | "minute" | "minutes" => from_secs_checked(amount, 60)?,
        "h" | "hour" | "hours" => from_secs_checked(amount, 3_600)?,
        "d" | "day" | "days" => from_secs_checked(amount, 86_400)?,
        _ => return Err("unknown duration unit"),
    };
    Ok(duration)
}

fn from_secs_checked(amount: u64, factor: u64) -> Result<Duration, &'static str> {
    amount
        .checked_mul(factor)
        .map(Duration::from_secs)
        .ok_or("duration overflow")
}

/// Byte offset where the integer part of a duration ends. Digits are those of
/// the radix named by a `0x` or `0b` prefix, so `0xAs` is ten seconds.
fn number_end(s: &str) -> usize {
    let sign = usize::from(s.starts_with(['+', '-']));
    let body = &s[sign..];
    let (skip, radix) = if strip_prefix_ci(body, "0x").is_some() {
        (2, 16)
    } else if strip_prefix_ci(body, "0b").is_some() {
        (2, 2)
    } else {
        (0, 10)
    };
    let start = sign + skip;
    let digits = s.as_bytes()[start..]
        .iter()
        .take_while(|&&b| b == b'_' || char::from(b).is_digit(radix))
        .count();
    start + digits
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => s.get(prefix.len()..),
        _ => None,
    }
}

fn is_hex_float(s: &str) -> bool {
    let s = s.trim_start_matches(['+', '-']);
    strip_prefix_ci(s, "0x").is_some()
}

/// Removes `_` digit separators, which may not lead or trail the digits.
fn strip_separators(digits: &str) -> Result<String, &'static str> {
    if digits.is_empty() {
        return Err("missing digits");
    }
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let between_digits = matches!(prev, Some(p) if p.is_ascii_alphanumeric() || p == '_')
                && matches!(next, Some(n) if n.is_ascii_alphanumeric() || n == '_');
            if !between_digits {
                return Err("misplaced digit separator");
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn parse_hex_float(hex: &str) -> Result<f64, &'static str> {
    let (mantissa, exponent) = hex
        .split_once(['p', 'P'])
        .ok_or("hexadecimal floating point literal requires an exponent")?;
    let mantissa = strip_separators(mantissa)?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa.as_str(), ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err("missing digits");
    }

    let mut value = 0f64;
    for c in int_part.chars() {
        let digit = c.to_digit(16).ok_or("invalid hexadecimal literal")?;
        value = value * 16.0 + f64::from(digit);
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        let digit = c.to_digit(16).ok_or("invalid hexadecimal literal")?;
        value += f64::from(digit) * scale;
        scale /= 16.0;
    }

    let exponent: i32 = exponent
        .parse()
        .map_err(|_| "invalid binary exponent")?;
    Ok(value * 2f64.powi(exponent))
}
