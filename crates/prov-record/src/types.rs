//! Provider record data model and its JSON representation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use multiaddr::Multiaddr;
use prov_crypto::PeerId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::error::RecordError;

/// Exchange protocol tag for block providers speaking bitswap.
pub const PROTOCOL_BITSWAP: &str = "transport-bitswap";

/// Rejected content identifier text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("content identifier must not be empty")]
pub struct InvalidCid;

/// A content identifier, carried in its text form.
///
/// Parsing CIDs into multihashes is the job of the block layer; here the
/// identifier only has to round-trip through the payload unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid(String);

impl Cid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Cid {
    type Error = InvalidCid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(InvalidCid);
        }
        Ok(Self(value))
    }
}

impl FromStr for Cid {
    type Err = InvalidCid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The structured claim a provider signs.
///
/// Members are serialized in declaration order, which makes the compact JSON
/// encoding of a given value stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "Keys", default, deserialize_with = "null_as_empty")]
    pub keys: Vec<Cid>,

    #[serde(rename = "Timestamp", default, with = "rfc3339_or_millis")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Non-authoritative freshness hint
    #[serde(rename = "AdvisoryTTL", default, with = "optional_millis")]
    pub advisory_ttl: Option<Duration>,

    #[serde(rename = "ID", default)]
    pub id: Option<PeerId>,

    #[serde(rename = "Addrs", default, deserialize_with = "null_as_empty")]
    pub addrs: Vec<Multiaddr>,
}

impl Payload {
    /// An empty claim attributed to `peer_id`.
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            id: Some(peer_id),
            ..Self::default()
        }
    }

    pub fn with_keys(mut self, keys: impl IntoIterator<Item = Cid>) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn with_addrs(mut self, addrs: impl IntoIterator<Item = Multiaddr>) -> Self {
        self.addrs.extend(addrs);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_advisory_ttl(mut self, ttl: Duration) -> Self {
        self.advisory_ttl = Some(ttl);
        self
    }
}

/// The exact JSON bytes of a payload as signed.
///
/// Once captured from the wire or produced for signing, these bytes are the
/// only input to the signature digest. Two encodings of an equal [`Payload`]
/// are different `RawPayload`s.
#[derive(Debug, Clone)]
pub struct RawPayload(Box<RawValue>);

impl RawPayload {
    /// Wrap JSON bytes, rejecting anything that is not a single JSON value.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }

    pub fn from_string(json: String) -> Result<Self, RecordError> {
        Ok(Self(RawValue::from_string(json)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.get().as_bytes()
    }

    pub(crate) fn from_raw_value(raw: Box<RawValue>) -> Self {
        Self(raw)
    }

    pub(crate) fn as_raw_value(&self) -> &RawValue {
        &self.0
    }
}

impl PartialEq for RawPayload {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for RawPayload {}

/// Read-path view of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadProviderResponse {
    #[serde(rename = "Protocol")]
    pub protocol: String,

    #[serde(rename = "ID", default)]
    pub id: Option<PeerId>,

    #[serde(rename = "Addrs", default, deserialize_with = "null_as_empty")]
    pub addrs: Vec<Multiaddr>,
}

/// Answer to a provider write: how long the routing service intends to keep
/// the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteProviderResponse {
    #[serde(rename = "AdvisoryTTL", with = "millis")]
    pub advisory_ttl: Duration,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps are written as RFC 3339 and read from RFC 3339 or Unix
/// milliseconds.
mod rfc3339_or_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireTime {
        Text(String),
        Millis(i64),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<WireTime>::deserialize(deserializer)? {
            None => Ok(None),
            Some(WireTime::Text(text)) => DateTime::parse_from_rfc3339(&text)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(D::Error::custom),
            Some(WireTime::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("timestamp {ms} out of range"))),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => super::millis::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
