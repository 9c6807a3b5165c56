use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::OrderId;

/// Version number of a stored document, used for compare-and-swap writes.
///
/// A document that does not exist is at version 0. Creating it moves it to
/// version 1 and every committed update increments it by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version (0) of a document that does not exist yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) of a freshly created document.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// A stored order document.
///
/// The full order lives in `payload`; `status`, `is_paid` and `created_at`
/// are copied out of it so the store can filter and sort without decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// The order this document belongs to.
    pub order_id: OrderId,

    /// Document version. Assigned by the store on every committed write.
    pub version: Version,

    /// When the order was created.
    pub created_at: DateTime<Utc>,

    /// When the document was last written.
    pub updated_at: DateTime<Utc>,

    /// Aggregate order status, indexed for queries.
    pub status: String,

    /// Whether the order has been paid, indexed for queries.
    pub is_paid: bool,

    /// The order document as JSON.
    pub payload: serde_json::Value,
}

impl OrderRecord {
    /// Creates a new record builder.
    pub fn builder() -> OrderRecordBuilder {
        OrderRecordBuilder::default()
    }

    /// Decodes the payload into a typed document.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Builder for constructing order records.
#[derive(Debug, Default)]
pub struct OrderRecordBuilder {
    order_id: Option<OrderId>,
    version: Option<Version>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    status: Option<String>,
    is_paid: bool,
    payload: Option<serde_json::Value>,
}

impl OrderRecordBuilder {
    /// Sets the order ID.
    pub fn order_id(mut self, id: OrderId) -> Self {
        self.order_id = Some(id);
        self
    }

    /// Sets the version. Defaults to [`Version::initial`]; the store
    /// overwrites it on write.
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the creation timestamp.
    pub fn created_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_at = Some(timestamp);
        self
    }

    /// Sets the last-write timestamp. Defaults to the creation timestamp.
    pub fn updated_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.updated_at = Some(timestamp);
        self
    }

    /// Sets the indexed status.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the indexed paid flag.
    pub fn is_paid(mut self, is_paid: bool) -> Self {
        self.is_paid = is_paid;
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the record.
    ///
    /// # Panics
    ///
    /// Panics if order_id, created_at, status or payload are not set.
    pub fn build(self) -> OrderRecord {
        let created_at = self.created_at.expect("created_at is required");
        OrderRecord {
            order_id: self.order_id.expect("order_id is required"),
            version: self.version.unwrap_or_default(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            status: self.status.expect("status is required"),
            is_paid: self.is_paid,
            payload: self.payload.expect("payload is required"),
        }
    }

    /// Tries to build the record, returning None if required fields are missing.
    pub fn try_build(self) -> Option<OrderRecord> {
        let created_at = self.created_at?;
        Some(OrderRecord {
            order_id: self.order_id?,
            version: self.version.unwrap_or_default(),
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
            status: self.status?,
            is_paid: self.is_paid,
            payload: self.payload?,
        })
    }
}

/// A named counter document, advanced with compare-and-swap writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Counter key, e.g. `token:20240315`.
    pub key: String,

    /// Current counter value.
    pub value: u64,

    /// Document version.
    pub version: Version,
}

impl Counter {
    /// Creates a counter document at the given value.
    pub fn new(key: impl Into<String>, value: u64) -> Self {
        Self {
            key: key.into(),
            value,
            version: Version::initial(),
        }
    }
}
