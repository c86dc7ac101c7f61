//! Pluggable validation of raw submissions, run before decoding.

use crate::types::Action;
use serde_json::Value;

/// Checks a submitted document before it is decoded.
///
/// The error string is returned verbatim to the submitter as the diagnostic.
pub trait CommandValidator: Send + Sync {
    fn validate(&self, raw: &[u8]) -> Result<(), String>;
}

impl<F> CommandValidator for F
where
    F: Fn(&[u8]) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, raw: &[u8]) -> Result<(), String> {
        self(raw)
    }
}

/// Minimal structural check of a command document: an object with a known
/// `action` string and a non-empty `target` object.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl CommandValidator for StructuralValidator {
    fn validate(&self, raw: &[u8]) -> Result<(), String> {
        let doc: Value = serde_json::from_slice(raw).map_err(|e| format!("#: not JSON: {e}"))?;
        let Some(obj) = doc.as_object() else {
            return Err("#: expected object".to_string());
        };

        match obj.get("action") {
            None => return Err("#: missing property 'action'".to_string()),
            Some(Value::String(action)) => {
                if !Action::from(action.clone()).is_known() {
                    return Err(format!("#/action: '{action}' is not a known action"));
                }
            }
            Some(_) => return Err("#/action: expected string".to_string()),
        }

        match obj.get("target") {
            None => Err("#: missing property 'target'".to_string()),
            Some(Value::Object(target)) if target.is_empty() => {
                Err("#/target: expected at least one property".to_string())
            }
            Some(Value::Object(_)) => Ok(()),
            Some(_) => Err("#/target: expected object".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_command() {
        let raw = br#"{"action":"deny","target":{"ipv4_net":"10.0.0.0/8"}}"#;
        assert!(StructuralValidator.validate(raw).is_ok());
    }

    #[test]
    fn reports_pointer_to_offending_field() {
        let err = StructuralValidator
            .validate(br#"{"action":"permit","target":{"ipv4_net":"1.2.3.4"}}"#)
            .unwrap_err();
        assert!(err.starts_with("#/action"), "{err}");

        let err = StructuralValidator
            .validate(br#"{"action":"deny","target":{}}"#)
            .unwrap_err();
        assert!(err.starts_with("#/target"), "{err}");

        let err = StructuralValidator.validate(br#"{"target":{"a":1}}"#).unwrap_err();
        assert!(err.contains("'action'"), "{err}");
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(StructuralValidator.validate(b"[1,2]").is_err());
        assert!(StructuralValidator.validate(b"not json").is_err());
    }

    #[test]
    fn closures_are_validators() {
        let reject_all = |_: &[u8]| -> Result<(), String> { Err("nope".to_string()) };
        assert_eq!(reject_all.validate(b"{}"), Err("nope".to_string()));
    }
}
