//! Lock request arguments and their flat key/value wire form.

use serde::{Deserialize, Serialize};

use super::LockError;

pub const UID_KEY: &str = "requester-id";
pub const SOURCE_KEY: &str = "source";
pub const RESOURCE_KEY: &str = "resource";
pub const SERVER_ADDR_KEY: &str = "caller-address";
pub const SERVICE_ENDPOINT_KEY: &str = "caller-service-endpoint";

/// Flat string key/value pairs attached to a lock call.
///
/// Serializes as a sequence of pairs, so it can be handed straight to a
/// form/query encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Values {
    pairs: Vec<(String, String)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.set(k, v);
        }
        values
    }
}

/// One request to a peer's lock coordinator.
///
/// Built fresh for every lock attempt by the quorum layer. Fields are
/// read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockArgs {
    #[serde(rename = "requester-id")]
    uid: String,
    source: String,
    resource: String,
    #[serde(rename = "caller-address")]
    server_addr: String,
    #[serde(rename = "caller-service-endpoint")]
    service_endpoint: String,
}

impl LockArgs {
    pub fn new(
        uid: impl Into<String>,
        source: impl Into<String>,
        resource: impl Into<String>,
        server_addr: impl Into<String>,
        service_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            source: source.into(),
            resource: resource.into(),
            server_addr: server_addr.into(),
            service_endpoint: service_endpoint.into(),
        }
    }

    /// Start building args for `resource`; unset fields default to empty.
    pub fn builder(resource: impl Into<String>) -> LockArgsBuilder {
        LockArgsBuilder {
            args: LockArgs::new("", "", resource, "", ""),
        }
    }

    /// Unique id of this lock attempt.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Address of the node issuing the request.
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Route at which the requesting node is reachable.
    pub fn service_endpoint(&self) -> &str {
        &self.service_endpoint
    }

    pub fn to_values(&self) -> Values {
        let mut values = Values::new();
        values.set(UID_KEY, self.uid.as_str());
        values.set(SOURCE_KEY, self.source.as_str());
        values.set(RESOURCE_KEY, self.resource.as_str());
        values.set(SERVER_ADDR_KEY, self.server_addr.as_str());
        values.set(SERVICE_ENDPOINT_KEY, self.service_endpoint.as_str());
        values
    }

    /// Decode args from wire pairs. Every key must be present; unknown keys
    /// are ignored.
    pub fn from_values<'a, I>(pairs: I) -> Result<Self, LockError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let values: Values = pairs.into_iter().collect();
        let field = |key: &str| {
            values
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| LockError::Decode(format!("missing field {}", key)))
        };
        Ok(LockArgs {
            uid: field(UID_KEY)?,
            source: field(SOURCE_KEY)?,
            resource: field(RESOURCE_KEY)?,
            server_addr: field(SERVER_ADDR_KEY)?,
            service_endpoint: field(SERVICE_ENDPOINT_KEY)?,
        })
    }
}

/// Builder returned by [`LockArgs::builder`].
#[derive(Debug, Clone)]
pub struct LockArgsBuilder {
    args: LockArgs,
}

impl LockArgsBuilder {
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.args.uid = uid.into();
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.args.source = source.into();
        self
    }

    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.args.server_addr = addr.into();
        self
    }

    pub fn service_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.args.service_endpoint = endpoint.into();
        self
    }

    pub fn build(self) -> LockArgs {
        self.args
    }
}
