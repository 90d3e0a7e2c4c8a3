//! Federation form extraction.

use std::sync::Arc;

use wsfed_client_sdk::{FormError, FormFieldQuery, Wresult};

/// Name of the form input carrying the federation result.
pub const WRESULT_FIELD: &str = "wresult";

/// Reads the `wresult` input out of a WS-Federation auto-post form.
#[derive(Clone)]
pub struct FederationFormExtractor {
    query: Arc<dyn FormFieldQuery>,
}

impl FederationFormExtractor {
    #[must_use]
    pub fn new(query: Arc<dyn FormFieldQuery>) -> Self {
        Self { query }
    }

    /// HTML-decoded value of the `wresult` input in `html`.
    ///
    /// # Errors
    ///
    /// Returns the query's [`FormError`] when the input or its `value` is
    /// missing.
    pub fn extract(&self, html: &str) -> Result<Wresult, FormError> {
        let raw = self.query.input_attribute(html, WRESULT_FIELD, "value")?;
        Ok(Wresult::new(html_decode(&raw)))
    }
}

/// Resolve named HTML entities and character references.
///
/// Unknown entities and bare `&` are kept as written.
#[must_use]
pub fn html_decode(raw: &str) -> String {
    html_escape::decode_html_entities(raw).into_owned()
}
