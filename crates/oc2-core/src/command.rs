use crate::error::{Oc2Error, Result};
use crate::types::{Action, TargetType};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One OpenC2 directive as it travels through the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: Action,
    pub target: Target,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub actuator: Map<String, Value>,
}

impl Command {
    pub fn new(action: Action, target: Target) -> Self {
        Self {
            action,
            target,
            id: None,
            args: Map::new(),
            actuator: Map::new(),
        }
    }

    /// Raw value of `args.response_requested`, if the submitter set one.
    pub fn response_requested(&self) -> Option<&Value> {
        self.args.get("response_requested")
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Address/port shape shared by the IPv4 and IPv6 connection targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpConnection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_addr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<u16>,
}

/// Target whose shape the relay does not model. Every tag/value pair is kept
/// as received so it can be re-encoded unchanged.
///
/// Only [`Target::from_tagged`] builds one, so a generic target never holds a
/// lone typed tag and always decodes back to itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GenericTarget(Map<String, Value>);

impl GenericTarget {
    pub fn get(&self, tag: &str) -> Option<&Value> {
        self.0.get(tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Ipv4Net(String),
    Ipv6Net(String),
    Ipv4Connection(IpConnection),
    Ipv6Connection(IpConnection),
    Generic(GenericTarget),
}

impl Target {
    /// The typed tag of this target, or `None` for a generic target.
    pub fn target_type(&self) -> Option<TargetType> {
        match self {
            Target::Ipv4Net(_) => Some(TargetType::Ipv4Net),
            Target::Ipv6Net(_) => Some(TargetType::Ipv6Net),
            Target::Ipv4Connection(_) => Some(TargetType::Ipv4Connection),
            Target::Ipv6Connection(_) => Some(TargetType::Ipv6Connection),
            Target::Generic(_) => None,
        }
    }

    /// Build a target from its wire form: a mapping from type tag to payload.
    ///
    /// Only a single known typed tag is decoded into a typed variant; anything
    /// else, including several tags at once, becomes [`Target::Generic`].
    pub fn from_tagged(tagged: Map<String, Value>) -> serde_json::Result<Self> {
        if tagged.len() == 1 {
            if let Some((tag, payload)) = tagged.iter().next() {
                let typed = match TargetType::from_tag(tag) {
                    Some(TargetType::Ipv4Net) => {
                        Some(Target::Ipv4Net(serde_json::from_value(payload.clone())?))
                    }
                    Some(TargetType::Ipv6Net) => {
                        Some(Target::Ipv6Net(serde_json::from_value(payload.clone())?))
                    }
                    Some(TargetType::Ipv4Connection) => Some(Target::Ipv4Connection(
                        serde_json::from_value(payload.clone())?,
                    )),
                    Some(TargetType::Ipv6Connection) => Some(Target::Ipv6Connection(
                        serde_json::from_value(payload.clone())?,
                    )),
                    _ => None,
                };
                if let Some(target) = typed {
                    tracing::debug!(target_type = %tag, "decoded typed target");
                    return Ok(target);
                }
            }
        }
        tracing::debug!(tags = ?tagged.keys().collect::<Vec<_>>(), "target kept as generic");
        Ok(Target::Generic(GenericTarget(tagged)))
    }
}

fn serialize_tagged<S, T>(serializer: S, tag: TargetType, payload: &T) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(tag.as_str(), payload)?;
    map.end()
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Target::Ipv4Net(net) => serialize_tagged(serializer, TargetType::Ipv4Net, net),
            Target::Ipv6Net(net) => serialize_tagged(serializer, TargetType::Ipv6Net, net),
            Target::Ipv4Connection(conn) => {
                serialize_tagged(serializer, TargetType::Ipv4Connection, conn)
            }
            Target::Ipv6Connection(conn) => {
                serialize_tagged(serializer, TargetType::Ipv6Connection, conn)
            }
            Target::Generic(generic) => generic.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tagged = Map::<String, Value>::deserialize(deserializer)?;
        Target::from_tagged(tagged).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Decode a submitted command document.
pub fn decode(bytes: &[u8]) -> Result<Command> {
    serde_json::from_slice(bytes).map_err(Oc2Error::Decode)
}

/// Encode a command back into its wire form.
pub fn encode(command: &Command) -> Result<Vec<u8>> {
    serde_json::to_vec(command).map_err(Oc2Error::Encode)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
