use std::collections::BTreeMap;

use crate::domain::FieldValue;

/// A validated `/input/` request, ready to become a point.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRequest {
    pub node: String,
    pub api_key: Option<String>,
    pub fields: BTreeMap<String, FieldValue>,
}

/// Form values from the query string and an url-encoded body.
///
/// Body values come first, so they win over query values of the same name.
#[derive(Debug, Default, Clone)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(query: Option<&str>, body: Option<&[u8]>) -> Self {
        let mut pairs = Vec::new();
        if let Some(body) = body {
            pairs.extend(decode(body));
        }
        if let Some(query) = query {
            pairs.extend(decode(query.as_bytes()));
        }
        Self { pairs }
    }

    /// First value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn decode(raw: &[u8]) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes(raw).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "ignoring undecodable form data");
        Vec::new()
    })
}
