use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Length of a server-minted asset id.
pub const ASSET_ID_LEN: usize = 16;

/// Namespace of certificate-derived asset ids. Header-asserted ids may not
/// use it.
pub const CERTIFICATE_ID_PREFIX: &str = "cert:";

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// The relay's view of one poller.
#[derive(Debug, Clone, Serialize)]
pub struct Asset {
    pub id: String,
    pub last_access: DateTime<Utc>,
    /// Index of the next log entry to deliver.
    pub read_cursor: usize,
}

impl Asset {
    fn new(id: String, read_cursor: usize) -> Self {
        Self {
            id,
            last_access: Utc::now(),
            read_cursor,
        }
    }

    pub fn touch(&mut self) {
        self.last_access = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// How a poll request identifies itself, strongest source first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// DER-encoded subject of a verified client certificate.
    Certificate(Vec<u8>),
    /// Opaque id sent by the client in the asset-id header.
    Asserted(String),
    Anonymous,
}

impl Identity {
    /// Pick the identity of a request: certificate, then non-empty header.
    ///
    /// A header claiming a certificate-derived id is ignored and the request
    /// is treated as anonymous.
    pub fn from_request(certificate_subject: Option<&[u8]>, asserted: Option<&str>) -> Self {
        if let Some(subject) = certificate_subject {
            return Identity::Certificate(subject.to_vec());
        }
        match asserted.map(str::trim) {
            Some(id) if id.starts_with(CERTIFICATE_ID_PREFIX) => {
                tracing::warn!(asset_id = id, "ignoring asserted certificate asset id");
                Identity::Anonymous
            }
            Some(id) if !id.is_empty() => Identity::Asserted(id.to_string()),
            _ => Identity::Anonymous,
        }
    }
}

/// Stable asset id for a certificate subject.
pub fn certificate_asset_id(subject: &[u8]) -> String {
    format!(
        "{CERTIFICATE_ID_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(Sha256::digest(subject))
    )
}

/// Generate a random alphanumeric asset id.
pub fn generate_asset_id() -> String {
    use rand::{distributions::Alphanumeric, Rng};
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ASSET_ID_LEN)
        .map(char::from)
        .collect()
}

// ---------------------------------------------------------------------------
// AssetRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: HashMap<String, Asset>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the asset for `identity`, registering it if unseen.
    ///
    /// A new asset starts reading at `log_len`, so it never receives commands
    /// submitted before it first polled. Returns the asset and whether it was
    /// created by this call.
    pub fn resolve(&mut self, identity: &Identity, log_len: usize) -> (&mut Asset, bool) {
        let id = match identity {
            Identity::Certificate(subject) => certificate_asset_id(subject),
            Identity::Asserted(id) => id.clone(),
            Identity::Anonymous => self.unused_id(),
        };
        match self.assets.entry(id) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => {
                let asset = Asset::new(entry.key().clone(), log_len);
                (entry.insert(asset), true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    fn unused_id(&self) -> String {
        loop {
            let id = generate_asset_id();
            if !self.assets.contains_key(&id) {
                return id;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
