use chrono::{DateTime, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Device identity as registered with the hub
pub type DeviceId = String;
