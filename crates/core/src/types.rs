/// Received signal strength in dBm. More negative means weaker.
pub type Dbm = i32;

/// Monotonic identifier assigned to every monitoring session.
pub type SessionId = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
