//! Order Store contract and its in-memory implementation.
//!
//! The store holds one versioned document per order plus small counter
//! documents used for daily numbering. Every committed write is published
//! to live [`Subscription`]s as a full snapshot of the collection.

pub mod error;
pub mod feed;
pub mod memory;
pub mod query;
pub mod record;
pub mod store;

pub use common::OrderId;
pub use error::{Result, StoreError};
pub use feed::{FeedPublisher, FeedSnapshot, FeedStream, Subscription};
pub use memory::InMemoryOrderStore;
pub use query::{OrderQuery, SortOrder};
pub use record::{Counter, OrderRecord, OrderRecordBuilder, Version};
pub use store::{OrderStore, OrderStoreExt, UpdateOptions};
