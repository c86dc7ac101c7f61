use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Command verb. Verbs outside the OpenC2 language set are carried as
/// [`Action::Other`] and relayed unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    Scan,
    Locate,
    Query,
    Deny,
    Contain,
    Allow,
    Start,
    Stop,
    Restart,
    Cancel,
    Set,
    Update,
    Redirect,
    Create,
    Delete,
    Detonate,
    Restore,
    Copy,
    Investigate,
    Remediate,
    Other(String),
}

impl Action {
    /// The OpenC2 language verbs; [`Action::Other`] is not among them.
    pub fn all() -> &'static [Action] {
        &[
            Action::Scan,
            Action::Locate,
            Action::Query,
            Action::Deny,
            Action::Contain,
            Action::Allow,
            Action::Start,
            Action::Stop,
            Action::Restart,
            Action::Cancel,
            Action::Set,
            Action::Update,
            Action::Redirect,
            Action::Create,
            Action::Delete,
            Action::Detonate,
            Action::Restore,
            Action::Copy,
            Action::Investigate,
            Action::Remediate,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Scan => "scan",
            Action::Locate => "locate",
            Action::Query => "query",
            Action::Deny => "deny",
            Action::Contain => "contain",
            Action::Allow => "allow",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
            Action::Cancel => "cancel",
            Action::Set => "set",
            Action::Update => "update",
            Action::Redirect => "redirect",
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Detonate => "detonate",
            Action::Restore => "restore",
            Action::Copy => "copy",
            Action::Investigate => "investigate",
            Action::Remediate => "remediate",
            Action::Other(verb) => verb,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Action::Other(_))
    }
}

impl From<String> for Action {
    fn from(verb: String) -> Self {
        Action::all()
            .iter()
            .find(|a| a.as_str() == verb)
            .cloned()
            .unwrap_or(Action::Other(verb))
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Other(verb) => verb,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TargetType
// ---------------------------------------------------------------------------

/// Wire tag naming the shape of a command target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Artifact,
    Command,
    Device,
    DomainName,
    EmailAddr,
    Features,
    File,
    IdnDomainName,
    IdnEmailAddr,
    Ipv4Net,
    Ipv6Net,
    Ipv4Connection,
    Ipv6Connection,
    Iri,
    MacAddr,
    Process,
    Properties,
    Uri,
}

impl TargetType {
    pub fn all() -> &'static [TargetType] {
        &[
            TargetType::Artifact,
            TargetType::Command,
            TargetType::Device,
            TargetType::DomainName,
            TargetType::EmailAddr,
            TargetType::Features,
            TargetType::File,
            TargetType::IdnDomainName,
            TargetType::IdnEmailAddr,
            TargetType::Ipv4Net,
            TargetType::Ipv6Net,
            TargetType::Ipv4Connection,
            TargetType::Ipv6Connection,
            TargetType::Iri,
            TargetType::MacAddr,
            TargetType::Process,
            TargetType::Properties,
            TargetType::Uri,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Artifact => "artifact",
            TargetType::Command => "command",
            TargetType::Device => "device",
            TargetType::DomainName => "domain_name",
            TargetType::EmailAddr => "email_addr",
            TargetType::Features => "features",
            TargetType::File => "file",
            TargetType::IdnDomainName => "idn_domain_name",
            TargetType::IdnEmailAddr => "idn_email_addr",
            TargetType::Ipv4Net => "ipv4_net",
            TargetType::Ipv6Net => "ipv6_net",
            TargetType::Ipv4Connection => "ipv4_connection",
            TargetType::Ipv6Connection => "ipv6_connection",
            TargetType::Iri => "iri",
            TargetType::MacAddr => "mac_addr",
            TargetType::Process => "process",
            TargetType::Properties => "properties",
            TargetType::Uri => "uri",
        }
    }

    pub fn from_tag(tag: &str) -> Option<TargetType> {
        TargetType::all().iter().copied().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
