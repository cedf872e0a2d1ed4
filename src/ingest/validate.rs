use std::collections::BTreeMap;

use crate::domain::FieldValue;
use crate::error::IngestError;
use crate::ingest::types::{FormFields, IngestRequest};

/// Checks node, credential and payload, in that order.
///
/// `credential` is the configured shared secret; `None` disables the check.
pub fn validate(form: &FormFields, credential: Option<&str>) -> Result<IngestRequest, IngestError> {
    let node = match form.get("node") {
        Some(n) if !n.is_empty() => n,
        _ => return Err(IngestError::MissingNode),
    };

    let api_key = form.get("apikey").filter(|k| !k.is_empty());
    if let Some(expected) = credential {
        match api_key {
            None => return Err(IngestError::MissingCredential),
            Some(given) if given != expected => return Err(IngestError::InvalidCredential),
            Some(_) => {}
        }
    }

    let fields = parse_fields(form.get("json").unwrap_or(""))?;

    Ok(IngestRequest {
        node: node.to_string(),
        api_key: api_key.map(str::to_string),
        fields,
    })
}

/// Parses the `json` form value as an object of field values.
pub fn parse_fields(raw: &str) -> Result<BTreeMap<String, FieldValue>, IngestError> {
    serde_json::from_str(raw).map_err(IngestError::MalformedPayload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(query: &str) -> FormFields {
        FormFields::parse(Some(query), None)
    }

    const JSON: &str = "json=%7B%22temp%22%3A21.5%7D";

    #[test]
    fn missing_or_empty_node() {
        for q in [JSON.to_string(), format!("node=&{JSON}")] {
            let err = validate(&form(&q), None).unwrap_err();
            assert!(matches!(err, IngestError::MissingNode), "{q}");
        }
    }

    #[test]
    fn node_is_checked_before_credential() {
        let err = validate(&form(JSON), Some("secret")).unwrap_err();
        assert!(matches!(err, IngestError::MissingNode));
    }

    #[test]
    fn credential_required_when_configured() {
        let err = validate(&form(&format!("node=n&{JSON}")), Some("secret")).unwrap_err();
        assert!(matches!(err, IngestError::MissingCredential));

        let err = validate(&form(&format!("node=n&apikey=&{JSON}")), Some("secret")).unwrap_err();
        assert!(matches!(err, IngestError::MissingCredential));
    }

    #[test]
    fn credential_must_match_exactly() {
        let err =
            validate(&form(&format!("node=n&apikey=Secret&{JSON}")), Some("secret")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidCredential));

        let req = validate(&form(&format!("node=n&apikey=secret&{JSON}")), Some("secret")).unwrap();
        assert_eq!(req.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn open_mode_ignores_apikey() {
        assert!(validate(&form(&format!("node=n&{JSON}")), None).is_ok());
        assert!(validate(&form(&format!("node=n&apikey=whatever&{JSON}")), None).is_ok());
    }

    #[test]
    fn payload_must_be_an_object() {
        for bad in ["", "json=", "json=%5B1%2C2%5D", "json=%7Bnope", "json=42"] {
            let err = validate(&form(&format!("node=n&{bad}")), None).unwrap_err();
            assert!(matches!(err, IngestError::MalformedPayload(_)), "{bad}");
            assert!(err.to_string().starts_with("Error unmarshalling json: "));
        }
    }

    #[test]
    fn parses_scalar_fields() {
        let fields = parse_fields(r#"{"a":1,"b":2.5,"on":true,"label":"x"}"#).unwrap();
        assert_eq!(fields["a"], FieldValue::Number(1.0));
        assert_eq!(fields["b"], FieldValue::Number(2.5));
        assert_eq!(fields["on"], FieldValue::Bool(true));
        assert_eq!(fields["label"], FieldValue::String("x".into()));
    }

    #[test]
    fn empty_object_passes_validation() {
        let req = validate(&form("node=n&json=%7B%7D"), None).unwrap();
        assert!(req.fields.is_empty());
    }
}
