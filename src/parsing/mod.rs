//! Message Parsing - pull readings and a trouble code out of free text
//!
//! Matching runs on the upper-cased message; the first match wins for each
//! signal. A number too large for `i64` is treated as absent.
//!
//! | signal      | pattern                              |
//! |-------------|--------------------------------------|
//! | DTC         | `P\d{4}`                             |
//! | RPM         | `(\d+)\s*RPM`                        |
//! | temperature | `(\d+)\s*°?C`                        |
//! | speed       | `(\d+)\s*(KMH\|KMPH\|KM/H\|SPEED)`   |

use std::sync::OnceLock;

use regex::Regex;

use crate::types::ParsedSignals;

struct Patterns {
    dtc: Regex,
    rpm: Regex,
    temperature: Regex,
    speed: Regex,
}

#[allow(clippy::expect_used)]
fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("valid regex literal");
        Patterns {
            dtc: re(r"(P\d{4})"),
            rpm: re(r"(\d+)\s*RPM"),
            temperature: re(r"(\d+)\s*°?C"),
            speed: re(r"(\d+)\s*(KMH|KMPH|KM/H|SPEED)"),
        }
    })
}

fn first_number(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Extract RPM, speed, temperature and DTC code from a user message.
pub fn parse_message(message: &str) -> ParsedSignals {
    let upper = message.to_uppercase();
    let p = patterns();

    ParsedSignals {
        rpm: first_number(&p.rpm, &upper),
        speed: first_number(&p.speed, &upper),
        temperature: first_number(&p.temperature, &upper),
        dtc_code: p
            .dtc
            .captures(&upper)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    }
}
