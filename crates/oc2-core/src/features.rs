//! Synchronous answers to `query features` commands.

use crate::command::{Command, Target};
use crate::error::{Oc2Error, Result};
use crate::response::{Response, Status};
use crate::types::{Action, TargetType};
use serde_json::{json, Map, Value};

pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];
pub const SUPPORTED_PROFILES: &[&str] = &["slpf"];

/// Target types the relay can carry with full typing for allow/deny.
pub const SUPPORTED_TARGETS: &[TargetType] = &[
    TargetType::Ipv4Net,
    TargetType::Ipv4Connection,
    TargetType::Ipv6Net,
    TargetType::Ipv6Connection,
];

/// Action to target-type table reported for the `pairs` feature.
pub fn pairs() -> Value {
    let targets: Vec<&str> = SUPPORTED_TARGETS.iter().map(|t| t.as_str()).collect();
    let mut table = Map::new();
    table.insert(Action::Allow.as_str().to_string(), json!(targets));
    table.insert(Action::Deny.as_str().to_string(), json!(targets));
    table.insert(
        Action::Query.as_str().to_string(),
        json!([TargetType::Features.as_str()]),
    );
    Value::Object(table)
}

/// Query responses are always synchronous, so only `complete` may be requested.
pub fn check_response_requested(command: &Command) -> Result<()> {
    match command.response_requested() {
        None => Ok(()),
        Some(rr) if rr.as_str() == Some("complete") => Ok(()),
        Some(rr) => {
            tracing::warn!(response_requested = %rr, "rejected query: response must be complete");
            Err(Oc2Error::QueryResponseRequested)
        }
    }
}

/// Answer a `query` command.
pub fn discover(command: &Command) -> Result<Response> {
    check_response_requested(command)?;

    let mut resp = Response::new(Status::Ok);
    let Target::Generic(target) = &command.target else {
        return Ok(resp);
    };
    let Some(requested) = target.get(TargetType::Features.as_str()).and_then(Value::as_array)
    else {
        return Ok(resp);
    };

    for feature in requested {
        match feature.as_str() {
            Some("versions") => resp.add_result("versions", json!(SUPPORTED_VERSIONS)),
            Some("profiles") => resp.add_result("profiles", json!(SUPPORTED_PROFILES)),
            Some("pairs") => resp.add_result("pairs", pairs()),
            _ => tracing::warn!(feature = %feature, "ignoring unknown feature in query"),
        }
    }
    Ok(resp)
}
