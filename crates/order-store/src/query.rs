use chrono::{DateTime, Utc};

use crate::OrderRecord;

/// Sort direction for query results, by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently created first.
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
}

/// Builder for constructing order queries.
///
/// Used both for one-shot `list` calls and as the filter of a live
/// subscription.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Only orders in one of these statuses.
    pub statuses: Option<Vec<String>>,

    /// Drop orders in any of these statuses.
    pub excluded_statuses: Option<Vec<String>>,

    /// Filter by paid flag.
    pub is_paid: Option<bool>,

    /// Orders created at or after this timestamp.
    pub created_from: Option<DateTime<Utc>>,

    /// Orders created strictly before this timestamp.
    pub created_before: Option<DateTime<Utc>>,

    /// Result ordering.
    pub sort: SortOrder,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query matching every order, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters to a single status.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.statuses = Some(vec![status.into()]);
        self
    }

    /// Filters to any of the given statuses.
    pub fn statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    /// Excludes the given statuses.
    pub fn excluding_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    /// Filters by paid flag.
    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }

    /// Filters to orders created at or after this timestamp.
    pub fn created_from(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_from = Some(timestamp);
        self
    }

    /// Filters to orders created strictly before this timestamp.
    pub fn created_before(mut self, timestamp: DateTime<Utc>) -> Self {
        self.created_before = Some(timestamp);
        self
    }

    /// Returns the oldest orders first.
    pub fn oldest_first(mut self) -> Self {
        self.sort = SortOrder::OldestFirst;
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the record passes every filter of this query.
    pub fn matches(&self, record: &OrderRecord) -> bool {
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&record.status)
        {
            return false;
        }
        if let Some(ref excluded) = self.excluded_statuses
            && excluded.contains(&record.status)
        {
            return false;
        }
        if let Some(is_paid) = self.is_paid
            && record.is_paid != is_paid
        {
            return false;
        }
        if let Some(from) = self.created_from
            && record.created_at < from
        {
            return false;
        }
        if let Some(before) = self.created_before
            && record.created_at >= before
        {
            return false;
        }
        true
    }

    /// Filters, sorts and truncates a set of records.
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a OrderRecord>) -> Vec<OrderRecord> {
        let mut matched: Vec<OrderRecord> = records
            .into_iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();

        // Ties on created_at fall back to the id so results are stable.
        matched.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.order_id.cmp(&b.order_id))
        });
        if self.sort == SortOrder::NewestFirst {
            matched.reverse();
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderId;
    use chrono::Duration;

    fn record(status: &str, is_paid: bool, created_at: DateTime<Utc>) -> OrderRecord {
        OrderRecord::builder()
            .order_id(OrderId::new())
            .created_at(created_at)
            .status(status)
            .is_paid(is_paid)
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[test]
    fn empty_query_matches_everything_newest_first() {
        let now = Utc::now();
        let older = record("pending", false, now - Duration::minutes(5));
        let newer = record("pending", false, now);

        let result = OrderQuery::new().apply([&older, &newer]);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].order_id, newer.order_id);
        assert_eq!(result[1].order_id, older.order_id);
    }

    #[test]
    fn oldest_first_reverses_order() {
        let now = Utc::now();
        let older = record("pending", false, now - Duration::minutes(5));
        let newer = record("pending", false, now);

        let result = OrderQuery::new().oldest_first().apply([&newer, &older]);
        assert_eq!(result[0].order_id, older.order_id);
    }

    #[test]
    fn status_filters_include_and_exclude() {
        let now = Utc::now();
        let pending = record("pending", false, now);
        let completed = record("completed", true, now);
        let held = record("on_hold", false, now);

        let only_pending = OrderQuery::new().status("pending").apply([&pending, &completed, &held]);
        assert_eq!(only_pending.len(), 1);
        assert_eq!(only_pending[0].status, "pending");

        let active = OrderQuery::new()
            .excluding_statuses(["completed", "on_hold"])
            .apply([&pending, &completed, &held]);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].order_id, pending.order_id);
    }

    #[test]
    fn paid_and_time_window_filters() {
        let now = Utc::now();
        let yesterday = record("completed", true, now - Duration::days(1));
        let today_paid = record("pending", true, now);
        let today_unpaid = record("pending", false, now);

        let result = OrderQuery::new()
            .paid(true)
            .created_from(now - Duration::hours(1))
            .apply([&yesterday, &today_paid, &today_unpaid]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_id, today_paid.order_id);

        let before = OrderQuery::new()
            .created_before(now - Duration::hours(1))
            .apply([&yesterday, &today_paid]);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].order_id, yesterday.order_id);
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let now = Utc::now();
        let records: Vec<_> = (0..5)
            .map(|i| record("pending", false, now + Duration::seconds(i)))
            .collect();

        let result = OrderQuery::new().limit(2).apply(records.iter());
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].order_id, records[4].order_id);
        assert_eq!(result[1].order_id, records[3].order_id);
    }
}
