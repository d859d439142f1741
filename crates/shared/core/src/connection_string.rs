//! Device connection strings
//!
//! `HostName=<hub>;DeviceId=<id>;SharedAccessKey=<key>`. Keys are case
//! sensitive; unknown keys are kept so transports can read them.

use std::fmt;
use std::str::FromStr;

use crate::error::ConnectionStringError;

const HOST_NAME: &str = "HostName";
const DEVICE_ID: &str = "DeviceId";
const MODULE_ID: &str = "ModuleId";
const CREDENTIAL_KEYS: [&str; 3] = ["SharedAccessKey", "SharedAccessSignature", "x509"];

/// Parsed credential and endpoint descriptor
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pairs: Vec<(String, String)>,
}

impl ConnectionString {
    /// Parse and validate a connection string
    pub fn parse(input: &str) -> Result<Self, ConnectionStringError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ConnectionStringError::Empty);
        }

        let mut pairs = Vec::new();
        for segment in input.split(';').filter(|s| !s.trim().is_empty()) {
            // Values may contain '=' (base64 keys), so split on the first one only
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConnectionStringError::MalformedSegment(redact_segment(segment)))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConnectionStringError::MalformedSegment(redact_segment(
                    segment,
                )));
            }
            pairs.push((key.to_string(), value.trim().to_string()));
        }

        let parsed = Self { pairs };
        parsed.require(HOST_NAME)?;
        parsed.require(DEVICE_ID)?;

        let has_credential = CREDENTIAL_KEYS.iter().any(|key| match parsed.get(key) {
            Some(value) if *key == "x509" => value.eq_ignore_ascii_case("true"),
            Some(value) => !value.is_empty(),
            None => false,
        });
        if !has_credential {
            return Err(ConnectionStringError::MissingCredential);
        }

        Ok(parsed)
    }

    fn require(&self, key: &'static str) -> Result<&str, ConnectionStringError> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConnectionStringError::MissingKey(key)),
        }
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn host_name(&self) -> &str {
        self.get(HOST_NAME).unwrap_or_default()
    }

    pub fn device_id(&self) -> &str {
        self.get(DEVICE_ID).unwrap_or_default()
    }

    pub fn module_id(&self) -> Option<&str> {
        self.get(MODULE_ID)
    }

    /// True when the device authenticates with an X.509 certificate
    pub fn uses_x509(&self) -> bool {
        self.get("x509")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }
}

impl FromStr for ConnectionString {
    type Err = ConnectionStringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_credential(key: &str) -> bool {
    CREDENTIAL_KEYS.contains(&key) && key != "x509"
}

fn redact_segment(segment: &str) -> String {
    match segment.split_once('=') {
        Some((key, _)) if is_credential(key.trim()) => format!("{}=***", key.trim()),
        _ => segment.to_string(),
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.pairs {
            if !first {
                f.write_str(";")?;
            }
            first = false;
            if is_credential(key) {
                write!(f, "{}=***", key)?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConnectionString")
            .field(&self.to_string())
            .finish()
    }
}
