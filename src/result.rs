//! Typed accessors over a terminal Result Frame.
//!
//! Kept as a thin read-only view rather than a owned struct, per spec.md §9
//! "dynamic JSON tree": the result schema is sparse and evolves with
//! firmware, so this wraps a borrowed [`Frame`] instead of baking a closed
//! shape into the engine.

use crate::value::Frame;

/// Read-only view over a [`Frame`] returned by `getResult`.
#[derive(Debug, Clone, Copy)]
pub struct ResultFrame<'a>(&'a Frame);

impl<'a> ResultFrame<'a> {
    /// Wrap `frame` for typed field access.
    #[must_use]
    pub const fn new(frame: &'a Frame) -> Self { Self(frame) }

    /// `true` iff the terminal frame reports the transaction approved.
    #[must_use]
    pub fn success(&self) -> Option<bool> { self.0.get_bool("success") }

    /// `true` iff the issuer/scheme declined the transaction.
    #[must_use]
    pub fn declined(&self) -> Option<bool> { self.0.get_bool("declined") }

    /// Scheme/issuer authorization code, if present.
    #[must_use]
    pub fn auth_code(&self) -> Option<&str> { self.0.get_str("authCode") }

    /// Retrieval reference number, if present.
    #[must_use]
    pub fn rrn(&self) -> Option<&str> { self.0.get_str("rrn") }

    /// Masked PAN, if present.
    #[must_use]
    pub fn pan_masked(&self) -> Option<&str> { self.0.get_str("panMasked") }

    /// Correlation id, preferring `sourceId` and falling back to `sourceid`
    /// (spec.md §9's open question on casing — both spellings are accepted
    /// on read, neither is normalized away).
    #[must_use]
    pub fn source_id(&self) -> Option<&str> {
        self.0.get_str("sourceId").or_else(|| self.0.get_str("sourceid"))
    }

    /// Customer receipt lines, if the field is present and is an array of
    /// `{text}` objects (spec.md §3); entries missing a string `text` field
    /// are skipped rather than failing the whole read.
    #[must_use]
    pub fn cust_receipt(&self) -> Vec<&str> { self.receipt_lines("custReceipt") }

    /// Merchant receipt lines, same shape as [`Self::cust_receipt`].
    #[must_use]
    pub fn merch_receipt(&self) -> Vec<&str> { self.receipt_lines("merchReceipt") }

    /// `true` iff `success == true` and `declined != true`.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.success().unwrap_or(false) && !self.declined().unwrap_or(false)
    }

    fn receipt_lines(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_object())
                    .filter_map(|line| line.get("text"))
                    .filter_map(|v| v.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}
