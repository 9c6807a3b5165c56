//! Daily order number and token allocation.
//!
//! Both sequences live in counter documents keyed by business date, so they
//! restart at 1 every day and are shared by every terminal writing to the
//! same store. Allocation is a compare-and-swap increment: two terminals
//! placing orders at the same moment never receive the same value.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use order_store::{OrderStore, OrderStoreExt};

use crate::error::DomainError;
use crate::order::{OrderNumber, TokenNumber};

/// Default number of attempts for one counter increment.
pub const DEFAULT_COUNTER_ATTEMPTS: u32 = 8;

/// Allocates order numbers and kitchen tokens.
#[derive(Debug, Clone)]
pub struct SequenceAllocator<S: OrderStore> {
    store: S,
    utc_offset: FixedOffset,
    max_attempts: u32,
}

impl<S: OrderStore> SequenceAllocator<S> {
    /// Creates an allocator whose business day follows UTC.
    pub fn new(store: S) -> Self {
        Self {
            store,
            utc_offset: Utc.fix(),
            max_attempts: DEFAULT_COUNTER_ATTEMPTS,
        }
    }

    /// Sets the timezone offset that defines the business day.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Sets how many times a contended increment is attempted.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Returns the business date `now` falls on.
    pub fn business_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset).date_naive()
    }

    /// Allocates the next order number for the business day of `now`.
    #[tracing::instrument(skip(self))]
    pub async fn next_order_number(&self, now: DateTime<Utc>) -> Result<OrderNumber, DomainError> {
        let date = self.business_date(now);
        let sequence = self.increment(&order_number_key(date)).await?;
        Ok(OrderNumber::new(date, sequence))
    }

    /// Allocates the next kitchen token for the business day of `now`.
    #[tracing::instrument(skip(self))]
    pub async fn next_token(&self, now: DateTime<Utc>) -> Result<TokenNumber, DomainError> {
        let date = self.business_date(now);
        let value = self.increment(&token_key(date)).await?;
        Ok(TokenNumber::Issued(value))
    }

    async fn increment(&self, key: &str) -> Result<u32, DomainError> {
        let value = self.store.increment_counter(key, self.max_attempts).await?;
        tracing::debug!(key, value, "allocated sequence value");
        u32::try_from(value).map_err(|_| DomainError::SequenceExhausted {
            key: key.to_string(),
            value,
        })
    }
}

fn order_number_key(date: NaiveDate) -> String {
    format!("order-number:{}", date.format("%Y%m%d"))
}

fn token_key(date: NaiveDate) -> String {
    format!("token:{}", date.format("%Y%m%d"))
}
