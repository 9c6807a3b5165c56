//! Role-specific terminals.
//!
//! Each adapter wraps a [`Terminal`] with the commands its role may issue.
//! Kitchen and bar commands start from the terminal's cached copy of the
//! order; order-entry commands load the order from the store and settle
//! ingredient stock when an order becomes due.

use common::OrderId;
use domain::{
    CommandResult, EditHeldOrder, Order, OrderItem, OrderItemId, OrderItemStatus, PaymentDetails,
    PlaceOrder, ResumeOrder,
};
use order_store::OrderStore;
use stock::{DeductionReport, IngredientStore, RecipeBook, StockDeductionCoordinator, StockError};

use crate::error::Result;
use crate::terminal::{SyncOutcome, Terminal};
use crate::views::{BarView, KitchenView, OrderEntryView};

/// What happened to ingredient stock after an order-entry command.
#[derive(Debug)]
pub enum StockOutcome {
    /// The order did not become due for deduction with this write.
    NotDue,
    Deducted(DeductionReport),
    /// Deduction failed part-way. The order itself is persisted and marked
    /// settled; the error says how many lines were applied.
    Failed(StockError),
}

impl StockOutcome {
    pub fn is_deducted(&self) -> bool {
        matches!(self, StockOutcome::Deducted(_))
    }
}

/// Result of an order-entry command that may settle stock.
#[derive(Debug)]
pub struct EntryOutcome {
    pub result: CommandResult,
    pub stock: StockOutcome,
}

impl EntryOutcome {
    pub fn order(&self) -> &Order {
        &self.result.order
    }
}

/// The counter terminal: places, holds, edits, resumes, takes payment for
/// and cancels orders.
pub struct OrderEntryTerminal<S, R, I>
where
    S: OrderStore + Clone,
    R: RecipeBook,
    I: IngredientStore,
{
    terminal: Terminal<S, OrderEntryView>,
    stock: StockDeductionCoordinator<R, I>,
}

impl<S, R, I> OrderEntryTerminal<S, R, I>
where
    S: OrderStore + Clone,
    R: RecipeBook,
    I: IngredientStore,
{
    pub fn new(terminal: Terminal<S, OrderEntryView>, stock: StockDeductionCoordinator<R, I>) -> Self {
        Self { terminal, stock }
    }

    pub fn terminal(&self) -> &Terminal<S, OrderEntryView> {
        &self.terminal
    }

    pub fn stock(&self) -> &StockDeductionCoordinator<R, I> {
        &self.stock
    }

    pub async fn sync(&mut self) -> Result<SyncOutcome> {
        self.terminal.sync().await
    }

    /// Held orders, newest first.
    pub fn held_orders(&self) -> Vec<&Order> {
        self.terminal.view().held(self.terminal.orders())
    }

    /// The most recent paid orders that are not on hold.
    pub fn recent_paid(&self) -> Vec<&Order> {
        self.terminal.view().recent_paid(self.terminal.orders())
    }

    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn place(&mut self, cmd: PlaceOrder) -> Result<EntryOutcome> {
        let result = self.terminal.service().place_order(cmd).await?;
        Ok(self.finish(result).await)
    }

    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn hold(&mut self, order_id: OrderId) -> Result<CommandResult> {
        let result = self.terminal.service().hold_order(order_id).await?;
        self.terminal.remember(result.order.clone());
        Ok(result)
    }

    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn edit_held(&mut self, cmd: EditHeldOrder) -> Result<CommandResult> {
        let result = self.terminal.service().edit_held_order(cmd).await?;
        self.terminal.remember(result.order.clone());
        Ok(result)
    }

    /// Releases a held order, optionally taking payment in the same write.
    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn resume(&mut self, cmd: ResumeOrder) -> Result<EntryOutcome> {
        let result = self.terminal.service().resume_order(cmd).await?;
        Ok(self.finish(result).await)
    }

    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn record_payment(
        &mut self,
        order_id: OrderId,
        payment: PaymentDetails,
    ) -> Result<EntryOutcome> {
        let result = self
            .terminal
            .service()
            .record_payment(order_id, payment)
            .await?;
        Ok(self.finish(result).await)
    }

    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn cancel(&mut self, order_id: OrderId, reason: Option<String>) -> Result<CommandResult> {
        let result = self
            .terminal
            .service()
            .cancel_order(order_id, reason)
            .await?;
        self.terminal.remember(result.order.clone());
        Ok(result)
    }

    async fn finish(&mut self, result: CommandResult) -> EntryOutcome {
        self.terminal.remember(result.order.clone());
        let stock = self.settle(&result).await;
        EntryOutcome { result, stock }
    }

    async fn settle(&self, result: &CommandResult) -> StockOutcome {
        if !result.settled() {
            return StockOutcome::NotDue;
        }

        match self.stock.deduct_for_order(&result.order).await {
            Ok(report) => {
                tracing::info!(
                    order_id = ?result.order.id(),
                    lines = report.deductions.len(),
                    skipped = report.skipped.len(),
                    "stock settled"
                );
                StockOutcome::Deducted(report)
            }
            Err(e) => {
                tracing::error!(order_id = ?result.order.id(), error = %e, "stock deduction failed");
                StockOutcome::Failed(e)
            }
        }
    }
}

/// A kitchen station board.
pub struct KitchenTerminal<S>
where
    S: OrderStore + Clone,
{
    terminal: Terminal<S, KitchenView>,
}

impl<S> KitchenTerminal<S>
where
    S: OrderStore + Clone,
{
    pub fn new(terminal: Terminal<S, KitchenView>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<S, KitchenView> {
        &self.terminal
    }

    pub async fn sync(&mut self) -> Result<SyncOutcome> {
        self.terminal.sync().await
    }

    /// Orders with work for this station, oldest first.
    pub fn queue(&self) -> Vec<&Order> {
        self.terminal.orders()
    }

    /// The items of `order` this station prepares.
    pub fn items<'a>(&self, order: &'a Order) -> Vec<&'a OrderItem> {
        self.terminal.view().items(order)
    }

    /// Moves one item of a cached order to `status`.
    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn set_item_status(
        &mut self,
        order_id: OrderId,
        item_id: OrderItemId,
        status: OrderItemStatus,
    ) -> Result<CommandResult> {
        let order = self.terminal.cached(order_id)?;
        let result = self
            .terminal
            .service()
            .change_item_status_from(order, item_id, status)
            .await?;
        self.terminal.remember(result.order.clone());
        Ok(result)
    }

    pub async fn start_preparing(
        &mut self,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<CommandResult> {
        self.set_item_status(order_id, item_id, OrderItemStatus::Preparing)
            .await
    }

    pub async fn mark_ready(&mut self, order_id: OrderId, item_id: OrderItemId) -> Result<CommandResult> {
        self.set_item_status(order_id, item_id, OrderItemStatus::Ready)
            .await
    }
}

/// The serving board.
pub struct BarTerminal<S>
where
    S: OrderStore + Clone,
{
    terminal: Terminal<S, BarView>,
}

impl<S> BarTerminal<S>
where
    S: OrderStore + Clone,
{
    pub fn new(terminal: Terminal<S, BarView>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<S, BarView> {
        &self.terminal
    }

    pub async fn sync(&mut self) -> Result<SyncOutcome> {
        self.terminal.sync().await
    }

    /// Orders with something ready or already served, oldest first.
    pub fn queue(&self) -> Vec<&Order> {
        self.terminal.orders()
    }

    /// Items of `order` waiting to be carried out.
    pub fn awaiting<'a>(&self, order: &'a Order) -> Vec<&'a OrderItem> {
        self.terminal.view().awaiting(order)
    }

    /// Marks one item of a cached order as delivered.
    #[tracing::instrument(skip(self), fields(terminal = %self.terminal.id()))]
    pub async fn mark_delivered(
        &mut self,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<CommandResult> {
        let order = self.terminal.cached(order_id)?;
        let result = self
            .terminal
            .service()
            .mark_item_delivered_from(order, item_id)
            .await?;
        self.terminal.remember(result.order.clone());
        Ok(result)
    }
}
