//! Display helpers.

use crate::principal::Principal;
use chrono::{DateTime, Local, TimeZone, Utc};

const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Ledger timestamp (ns since epoch) in the local time zone.
pub fn format_timestamp(nanos: u64) -> String { format_timestamp_in(nanos, &Local) }

pub fn format_timestamp_in<Tz: TimeZone>(nanos: u64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let millis = i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX);
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string(),
        None => "Invalid Date".to_string(),
    }
}

/// `aaaaaaaaaa...zzzzzzzzzz` for identifiers longer than 20 characters.
pub fn truncate_identifier(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 20 {
        return text.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{head}...{tail}")
}

pub fn format_principal(principal: &Principal) -> String { truncate_identifier(&principal.to_text()) }

/// `1234567` → `1,234,567 UTK`
pub fn format_amount(amount: u64, symbol: &str) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + symbol.len() + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push(' ');
    out.push_str(symbol);
    out
}
