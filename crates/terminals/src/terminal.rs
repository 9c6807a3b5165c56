//! Synchronization core shared by every terminal role.

use common::OrderId;
use domain::{Order, OrderService};
use order_store::{FeedSnapshot, OrderStore, Subscription};

use crate::alerts::NewOrderAlerter;
use crate::cache::{FeedChange, OrderCache};
use crate::config::TerminalRole;
use crate::error::{Result, TerminalError};
use crate::views::RoleView;

/// What one applied snapshot did to a terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Store revision the terminal is now at.
    pub revision: u64,
    pub changes: Vec<FeedChange>,
    /// Orders to flag as new on this terminal.
    pub alerts: Vec<OrderId>,
}

impl SyncOutcome {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.alerts.is_empty()
    }
}

/// One terminal's live copy of the order collection.
///
/// The terminal owns its subscription. Each call to [`Terminal::sync`]
/// applies one snapshot from the feed to the local cache and decides which
/// orders to alert on. Writes go through the shared [`OrderService`] and
/// their results are folded into the cache without waiting for the feed.
pub struct Terminal<S, V>
where
    S: OrderStore + Clone,
    V: RoleView,
{
    id: String,
    service: OrderService<S>,
    subscription: Subscription,
    cache: OrderCache,
    alerter: NewOrderAlerter,
    view: V,
}

impl<S, V> Terminal<S, V>
where
    S: OrderStore + Clone,
    V: RoleView,
{
    /// Subscribes to the store with the view's query.
    ///
    /// Nothing is cached until the first [`Terminal::sync`].
    #[tracing::instrument(skip_all, fields(role = %view.role()))]
    pub async fn connect(id: impl Into<String>, service: OrderService<S>, view: V) -> Result<Self> {
        let id = id.into();
        let subscription = service.store().subscribe(view.query()).await?;
        tracing::info!(terminal = %id, "terminal connected");

        Ok(Self {
            id,
            service,
            subscription,
            cache: OrderCache::new(),
            alerter: NewOrderAlerter::new(),
            view,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> TerminalRole {
        self.view.role()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn service(&self) -> &OrderService<S> {
        &self.service
    }

    /// Store revision of the last snapshot applied.
    pub fn revision(&self) -> u64 {
        self.cache.revision()
    }

    /// Returns true once the first snapshot has been applied.
    pub fn is_synced(&self) -> bool {
        self.alerter.is_primed()
    }

    /// Waits for the next snapshot and applies it.
    ///
    /// The first call returns the current state immediately. A feed error
    /// leaves the cache untouched; the next call picks up wherever the
    /// store is by then.
    #[tracing::instrument(skip(self), fields(terminal = %self.id))]
    pub async fn sync(&mut self) -> Result<SyncOutcome> {
        match self.subscription.next().await {
            Some(Ok(snapshot)) => self.apply(&snapshot),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "order feed error");
                Err(e.into())
            }
            None => Err(TerminalError::FeedClosed),
        }
    }

    /// Applies a pending snapshot if there is one, without waiting.
    pub fn try_sync(&mut self) -> Result<Option<SyncOutcome>> {
        match self.subscription.try_next() {
            Some(Ok(snapshot)) => self.apply(&snapshot).map(Some),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// Re-reads the full current state, as after a reconnect.
    pub async fn resync(&mut self) -> Result<SyncOutcome> {
        self.subscription.restart();
        self.sync().await
    }

    /// Orders on this terminal's board, in feed order.
    pub fn orders(&self) -> Vec<&Order> {
        self.cache
            .orders()
            .filter(|order| self.view.includes(order))
            .collect()
    }

    /// The cached copy of an order, whether or not the view shows it.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.cache.get(order_id)
    }

    /// A clone of the cached copy, for starting a command from it.
    pub fn cached(&self, order_id: OrderId) -> Result<Order> {
        self.cache
            .get(order_id)
            .cloned()
            .ok_or(TerminalError::OrderNotCached(order_id))
    }

    /// Folds the result of this terminal's own write into the cache.
    pub fn remember(&mut self, order: Order) {
        self.cache.remember(order);
    }

    fn apply(&mut self, snapshot: &FeedSnapshot) -> Result<SyncOutcome> {
        let started = std::time::Instant::now();

        let changes = self.cache.reconcile(snapshot)?;
        for change in &changes {
            if let FeedChange::Removed(order_id) = change {
                self.alerter.forget(*order_id);
            }
        }

        let alerts = self
            .alerter
            .observe(self.cache.orders().filter(|order| self.view.includes(order)));

        metrics::histogram!("terminal_sync_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        if !changes.is_empty() {
            tracing::debug!(
                revision = self.cache.revision(),
                changes = changes.len(),
                alerts = alerts.len(),
                "snapshot applied"
            );
        }

        Ok(SyncOutcome {
            revision: self.cache.revision(),
            changes,
            alerts,
        })
    }
}

impl<S, V> std::fmt::Debug for Terminal<S, V>
where
    S: OrderStore + Clone,
    V: RoleView,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("id", &self.id)
            .field("role", &self.view.role())
            .field("revision", &self.cache.revision())
            .field("orders", &self.cache.len())
            .finish()
    }
}
