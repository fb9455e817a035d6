//! Frame Parser (C2): normalizes a raw PED reply into a [`Frame`].
//!
//! The gateway interleaves human-readable prefixes before the JSON body on
//! error/transaction replies (spec.md §4.2); this module applies the four
//! classification rules in order and always returns *some* object-shaped
//! frame, never propagating a parse failure as an error value — unparseable
//! input becomes a frame carrying `parseError`/`raw` fields instead, so the
//! poll loop can treat it as "no information this tick" (spec.md §7,
//! `ParseError`).
//!
//! Grounded on `leynos-mxd/src/transaction/frame.rs` and `errors.rs` for the
//! "one small per-module error enum, validate then parse" shape, adapted
//! from Hotline's fixed 20-byte binary header to NGPAS's newline-delimited
//! JSON-with-text-prefix frames.

use serde_json::Value;

use crate::value::Frame;

const ERROR_PREFIX: &str = "error";
const TRANSACTION_PREFIX: &str = "transaction";

/// Parse a raw PED response string into a [`Frame`] per spec.md §4.2 rules
/// 1–4, applied in order.
#[must_use]
pub fn parse(raw: &str) -> Frame {
    let trimmed = raw.trim();

    // Rule 1: empty/whitespace input -> empty object.
    if trimmed.is_empty() {
        return Frame::empty();
    }

    // Rule 2: leading token `error`.
    if let Some(rest) = strip_leading_token(trimmed, ERROR_PREFIX) {
        tracing::warn!(target: "ngpas::wire", "ERROR: {raw}");
        return parse_error_reply(raw, rest);
    }

    // Rule 3: leading token `transaction` -> strip prefix up to first `{`
    // and fall through to rule 4.
    let body = strip_leading_token(trimmed, TRANSACTION_PREFIX).unwrap_or(trimmed);

    // Rule 4: parse as a JSON object.
    parse_json_object(raw, body)
}

/// Strip a case-sensitive leading token (`token` followed by whitespace or
/// `{`/`(`) and return the remainder, trimmed. `None` if `input` does not
/// start with `token` as a whole word.
fn strip_leading_token<'a>(input: &'a str, token: &str) -> Option<&'a str> {
    let rest = input.strip_prefix(token)?;
    let boundary_ok = rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '(');
    boundary_ok.then(|| rest.trim_start())
}

/// Rule 2: locate the first `{` in `rest`; parse the tail as an object. On
/// parse failure, or if there is no `{` at all, fall back to `{error: raw}`
/// (optionally carrying `parseError`).
#[expect(clippy::string_slice, reason = "brace_idx is a `char_indices`-valid boundary returned by `str::find`")]
fn parse_error_reply(raw: &str, rest: &str) -> Frame {
    let Some(brace_idx) = rest.find('{') else {
        return Frame::empty().with("error", raw.to_owned());
    };
    let tail = &rest[brace_idx..];
    match serde_json::from_str::<Value>(tail) {
        Ok(Value::Object(map)) => Frame::from_object(map),
        Ok(_) | Err(_) => Frame::empty()
            .with("error", raw.to_owned())
            .with("parseError", "error reply body is not a JSON object".to_owned()),
    }
}

/// Rule 4: parse `body` as a JSON object; on failure return
/// `{parseError, raw}`.
fn parse_json_object(raw: &str, body: &str) -> Frame {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Frame::from_object(map),
        Ok(_) => Frame::empty()
            .with("parseError", "response is valid JSON but not an object".to_owned())
            .with("raw", raw.to_owned()),
        Err(e) => Frame::empty()
            .with("parseError", e.to_string())
            .with("raw", raw.to_owned()),
    }
}
