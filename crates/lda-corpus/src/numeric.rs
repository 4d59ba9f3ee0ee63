//! Numeric-token detection.
//!
//! A token counts as a number when it is, over ASCII digits only:
//! - an optionally signed integer or decimal (`1998`, `-2`, `3.14`, `.5`),
//!   optionally with an exponent (`1e5`, `2.5E-3`)
//! - an optionally signed comma-grouped integer with an optional decimal
//!   part (`1,000`, `12,345.67`)
//!
//! Non-ASCII digits, `inf`, `nan`, hexadecimal literals and mixed tokens
//! such as `3d` or `covid19` are not numbers. The rule does not depend on
//! the process locale.

use std::sync::OnceLock;

use regex::Regex;

static NUMERIC: OnceLock<Regex> = OnceLock::new();

fn numeric_pattern() -> &'static Regex {
    NUMERIC.get_or_init(|| {
        Regex::new(
            r"^[+-]?(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?|[0-9]{1,3}(?:,[0-9]{3})+(?:\.[0-9]+)?)$",
        )
        .expect("numeric token pattern is valid")
    })
}

/// Check whether a token parses entirely as a number.
pub fn is_numeric_token(token: &str) -> bool {
    numeric_pattern().is_match(token)
}
