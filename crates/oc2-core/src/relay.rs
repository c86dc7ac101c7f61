use crate::asset::{Asset, AssetRegistry, Identity};
use crate::command;
use crate::config::RelayConfig;
use crate::error::{Oc2Error, Result};
use crate::features;
use crate::log::{CommandLog, LogEntry};
use crate::media::{is_command_media_type, COMMAND_MEDIA_TYPE};
use crate::response::Response;
use crate::types::Action;
use crate::validate::{CommandValidator, StructuralValidator};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to an accepted submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Queued; the submitter gets a generic acknowledgement.
    Queued { index: usize },
    /// Queued; the submitter asked for no response body.
    Silent { index: usize },
    /// A query, queued and answered synchronously.
    Answered { index: usize, response: Response },
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub asset_id: String,
    /// The asset was registered by this poll.
    pub created: bool,
    /// Log index and encoded body of the delivered command, if one was pending.
    pub command: Option<(usize, Vec<u8>)>,
}

/// Consistent copy of the relay state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub commands: Vec<LogEntry>,
    pub assets: Vec<Asset>,
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RelayState {
    log: CommandLog,
    assets: AssetRegistry,
}

/// Command log and asset cursors behind one lock.
///
/// Every read of the log length, asset lookup, cursor advance and append
/// happens while holding the same mutex, so two polls under one identity can
/// never receive the same entry and a poll racing a submit either sees the new
/// entry in full or not at all.
#[derive(Default)]
pub struct Relay {
    state: Mutex<RelayState>,
    validator: Option<Arc<dyn CommandValidator>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(validator: Arc<dyn CommandValidator>) -> Self {
        Self {
            state: Mutex::default(),
            validator: Some(validator),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        if config.strict_validation {
            Self::with_validator(Arc::new(StructuralValidator))
        } else {
            Self::new()
        }
    }

    // The guarded structures are only mutated by infallible operations, so a
    // poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, RelayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, decode and queue a submitted command document.
    pub fn submit(&self, content_type: Option<&str>, body: &[u8]) -> Result<Submission> {
        let content_type = content_type.unwrap_or_default();
        if !is_command_media_type(content_type) {
            tracing::warn!(content_type, "rejected submission: wrong Content-Type");
            return Err(Oc2Error::WrongContentType {
                got: content_type.to_string(),
                expected: COMMAND_MEDIA_TYPE,
            });
        }

        if let Some(validator) = &self.validator {
            validator.validate(body).map_err(|diagnostic| {
                tracing::warn!(%diagnostic, "rejected submission: schema validation failed");
                Oc2Error::SchemaViolation(diagnostic)
            })?;
        }

        let cmd = command::decode(body).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected submission: cannot decode");
        })?;
        tracing::debug!(?cmd, "decoded command");

        let is_query = cmd.action == Action::Query;
        if is_query {
            features::check_response_requested(&cmd)?;
        }
        let silent = !is_query
            && cmd.response_requested().and_then(|rr| rr.as_str()) == Some("none");

        let answer = is_query.then(|| features::discover(&cmd));
        let (index, assets) = {
            let mut state = self.lock();
            let index = state.log.append(cmd);
            (index, state.assets.len())
        };
        tracing::info!(index, assets, "command added to the queue");

        match answer {
            Some(response) => Ok(Submission::Answered {
                index,
                response: response?,
            }),
            None if silent => Ok(Submission::Silent { index }),
            None => Ok(Submission::Queued { index }),
        }
    }

    /// Deliver the next pending command for `identity`, if any.
    pub fn poll(&self, identity: &Identity) -> Result<Delivery> {
        let mut state = self.lock();
        let RelayState { log, assets } = &mut *state;

        let (asset, created) = assets.resolve(identity, log.len());
        asset.touch();
        if created {
            tracing::info!(asset_id = %asset.id, cursor = asset.read_cursor, "created new asset");
        }

        let command = match log.get(asset.read_cursor) {
            Some(next) => {
                let index = asset.read_cursor;
                let body = command::encode(next).inspect_err(|e| {
                    tracing::error!(asset_id = %asset.id, index, error = %e, "cannot encode command");
                })?;
                asset.read_cursor += 1;
                Some((index, body))
            }
            None => None,
        };

        Ok(Delivery {
            asset_id: asset.id.clone(),
            created,
            command,
        })
    }

    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().log.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        let mut assets: Vec<Asset> = state.assets.iter().cloned().collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Snapshot {
            commands: state.log.entries().collect(),
            assets,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{decode, Target};
    use crate::response::Status;
    use std::collections::HashSet;
    use std::thread;

    fn deny(net: &str) -> Vec<u8> {
        format!(r#"{{"action":"deny","target":{{"ipv4_net":"{net}"}}}}"#).into_bytes()
    }

    fn submit(relay: &Relay, body: &[u8]) -> Result<Submission> {
        relay.submit(Some(COMMAND_MEDIA_TYPE), body)
    }

    fn delivered_net(delivery: &Delivery) -> String {
        let (_, body) = delivery.command.as_ref().expect("expected a command");
        match decode(body).unwrap().target {
            Target::Ipv4Net(net) => net,
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn commands_are_delivered_in_order_then_nothing() {
        let relay = Relay::new();
        let id = Identity::Asserted("fw-1".into());
        assert!(relay.poll(&id).unwrap().command.is_none());

        for net in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            submit(&relay, &deny(net)).unwrap();
        }
        for net in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert_eq!(delivered_net(&relay.poll(&id).unwrap()), net);
        }
        assert!(relay.poll(&id).unwrap().command.is_none());
    }

    #[test]
    fn late_asset_skips_backlog() {
        let relay = Relay::new();
        submit(&relay, &deny("10.0.0.1")).unwrap();
        submit(&relay, &deny("10.0.0.2")).unwrap();

        let id = Identity::Asserted("late".into());
        let first = relay.poll(&id).unwrap();
        assert!(first.created);
        assert!(first.command.is_none());

        submit(&relay, &deny("10.0.0.3")).unwrap();
        let next = relay.poll(&id).unwrap();
        assert!(!next.created);
        assert_eq!(next.command.as_ref().map(|(i, _)| *i), Some(2));
        assert_eq!(delivered_net(&next), "10.0.0.3");
    }

    #[test]
    fn wrong_content_type_is_not_queued() {
        let relay = Relay::new();
        for ct in [None, Some("application/json"), Some("text/plain")] {
            let err = relay.submit(ct, &deny("10.0.0.1")).unwrap_err();
            assert!(matches!(err, Oc2Error::WrongContentType { .. }));
        }
        assert!(relay.is_empty());
    }

    #[test]
    fn undecodable_body_is_not_queued() {
        let relay = Relay::new();
        assert!(matches!(submit(&relay, b"{oops"), Err(Oc2Error::Decode(_))));
        assert!(relay.is_empty());
    }

    #[test]
    fn validator_rejects_before_decode() {
        let relay = Relay::with_validator(Arc::new(|_: &[u8]| -> std::result::Result<(), String> {
            Err("#/target: nope".to_string())
        }));
        let err = submit(&relay, &deny("10.0.0.1")).unwrap_err();
        assert!(matches!(err, Oc2Error::SchemaViolation(ref d) if d == "#/target: nope"));
        assert!(relay.is_empty());
    }

    #[test]
    fn strict_config_attaches_structural_validator() {
        let config = RelayConfig {
            strict_validation: true,
            ..RelayConfig::default()
        };
        let relay = Relay::from_config(&config);
        let err = submit(&relay, br#"{"action":"deny","target":{}}"#).unwrap_err();
        assert!(matches!(err, Oc2Error::SchemaViolation(_)));

        let lenient = Relay::from_config(&RelayConfig::default());
        assert!(submit(&lenient, br#"{"action":"deny","target":{}}"#).is_ok());
    }

    #[test]
    fn response_requested_none_is_silent() {
        let relay = Relay::new();
        let body =
            br#"{"action":"deny","target":{"ipv4_net":"10.0.0.1"},"args":{"response_requested":"none"}}"#;
        assert_eq!(submit(&relay, body).unwrap(), Submission::Silent { index: 0 });
        assert_eq!(relay.len(), 1);
    }

    #[test]
    fn query_is_answered_and_queued() {
        let relay = Relay::new();
        let body = br#"{"action":"query","target":{"features":["versions"]}}"#;
        match submit(&relay, body).unwrap() {
            Submission::Answered { index, response } => {
                assert_eq!(index, 0);
                assert_eq!(response.status, Status::Ok);
                assert!(response.results.contains_key("versions"));
            }
            other => panic!("expected answer, got {other:?}"),
        }
        assert_eq!(relay.snapshot().commands[0].command.action, Action::Query);
    }

    #[test]
    fn unknown_action_is_queued_and_delivered_unchanged() {
        let relay = Relay::new();
        let id = Identity::Asserted("fw-1".into());
        relay.poll(&id).unwrap();

        let body = br#"{"action":"x-acme-isolate","target":{"ipv4_net":"10.0.0.1"}}"#;
        assert_eq!(submit(&relay, body).unwrap(), Submission::Queued { index: 0 });

        let delivery = relay.poll(&id).unwrap();
        let (_, delivered) = delivery.command.expect("expected a command");
        let delivered: serde_json::Value = serde_json::from_slice(&delivered).unwrap();
        let submitted: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(delivered, submitted);
    }

    #[test]
    fn strict_mode_still_rejects_unknown_action() {
        let relay = Relay::with_validator(Arc::new(StructuralValidator));
        let body = br#"{"action":"x-acme-isolate","target":{"ipv4_net":"10.0.0.1"}}"#;
        assert!(matches!(submit(&relay, body), Err(Oc2Error::SchemaViolation(_))));
        assert!(relay.is_empty());
    }

    #[test]
    fn rejected_query_is_not_queued() {
        let relay = Relay::new();
        let body = br#"{"action":"query","target":{"features":["versions"]},"args":{"response_requested":"incomplete"}}"#;
        assert!(matches!(
            submit(&relay, body),
            Err(Oc2Error::QueryResponseRequested)
        ));
        assert!(relay.is_empty());
    }

    #[test]
    fn snapshot_lists_commands_and_assets() {
        let relay = Relay::new();
        submit(&relay, &deny("10.0.0.1")).unwrap();
        relay.poll(&Identity::Asserted("b".into())).unwrap();
        relay.poll(&Identity::Asserted("a".into())).unwrap();

        let snap = relay.snapshot();
        assert_eq!(snap.commands.len(), 1);
        let ids: Vec<&str> = snap.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(snap.assets.iter().all(|a| a.read_cursor == 1));
    }

    #[test]
    fn concurrent_pollers_share_one_cursor() {
        let relay = Arc::new(Relay::new());
        let id = Identity::Asserted("shared".into());
        relay.poll(&id).unwrap();

        const N: usize = 200;
        for i in 0..N {
            submit(&relay, &deny(&format!("10.0.{}.{}", i / 256, i % 256))).unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let relay = Arc::clone(&relay);
                let id = id.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some((index, _)) = relay.poll(&id).unwrap().command {
                        seen.push(index);
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<usize> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len(), "an index was delivered twice");
        all.sort_unstable();
        assert_eq!(all, (0..N).collect::<Vec<_>>(), "an index was skipped");
    }

    #[test]
    fn concurrent_submitters_get_distinct_indices() {
        let relay = Arc::new(Relay::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let relay = Arc::clone(&relay);
                thread::spawn(move || {
                    (0..50)
                        .map(|i| match submit(&relay, &deny(&format!("10.{t}.0.{i}"))).unwrap() {
                            Submission::Queued { index } => index,
                            other => panic!("unexpected {other:?}"),
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut indices: Vec<usize> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..200).collect::<Vec<_>>());
    }
}
