//! Order placement: stock check, order persistence, stock reduction.
//!
//! The three steps are not a transaction. A denied (or unanswered, under
//! `FailClosed`) check stops placement before anything is stored. Once the
//! order is stored it stays stored, even if the reduction is absorbed by the
//! inventory client; that gap is stock drift and is only logged.

use chrono::Utc;
use tracing::{info, warn};

use storefront_core::{DomainError, DomainResult, OrderNumber, RecordId};
use storefront_orders::{Order, PlaceOrder, PlacementStage, StageError};

use crate::inventory_client::{ReduceOutcome, StockCheck, StockGateway};
use crate::record_store::{IdSequence, RecordStore};

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementReceipt {
    pub order: Order,
    /// `StockReduced`, or `OrderPersisted` when the reduction was absorbed.
    pub stage: PlacementStage,
    pub reduction: ReduceOutcome,
}

impl PlacementReceipt {
    pub fn stock_drifted(&self) -> bool {
        matches!(self.reduction, ReduceOutcome::Absorbed { .. })
    }
}

pub struct OrderPlacement<S, G> {
    orders: S,
    gateway: G,
    ids: IdSequence,
}

fn stage_conflict(err: StageError) -> DomainError {
    DomainError::conflict(err.to_string())
}

fn order_not_found(id: RecordId) -> DomainError {
    DomainError::not_found(format!("order with id {id}"))
}

impl<S, G> OrderPlacement<S, G>
where
    S: RecordStore<Order>,
    G: StockGateway,
{
    pub fn new(orders: S, gateway: G) -> Self {
        let last = orders.list().last().map(Order::id_typed);
        Self {
            orders,
            gateway,
            ids: IdSequence::starting_after(last),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn place_order(&self, request: PlaceOrder) -> DomainResult<PlacementReceipt> {
        let sku = request.sku_code().clone();
        let stage = PlacementStage::default();

        let check = self.gateway.check_stock(&sku, request.quantity()).await;
        if let StockCheck::Fallback { available, reason } = &check {
            warn!(sku = %sku, available, %reason, "stock check answered by fallback");
        }
        let stage = stage.after_stock_check(check.is_available()).map_err(stage_conflict)?;
        if stage == PlacementStage::StockDenied {
            info!(sku = %sku, quantity = request.quantity(), ?stage, "order rejected");
            return Err(DomainError::product_not_in_stock(sku.as_str()));
        }

        let order = Order::place(self.ids.next_id(), OrderNumber::new(), &request, Utc::now());
        self.orders.save(order.clone());
        let stage = stage.advance(PlacementStage::OrderPersisted).map_err(stage_conflict)?;
        info!(
            id = %order.id_typed(),
            order_number = %order.order_number(),
            sku = %sku,
            quantity = order.quantity(),
            ?stage,
            "order persisted"
        );

        let reduction = self.gateway.reduce_stock(&sku, request.quantity()).await;
        let stage = match &reduction {
            ReduceOutcome::Reduced => stage.advance(PlacementStage::StockReduced).map_err(stage_conflict)?,
            ReduceOutcome::Absorbed { reason } => {
                warn!(
                    order_number = %order.order_number(),
                    sku = %sku,
                    quantity = order.quantity(),
                    %reason,
                    "order placed without stock reduction"
                );
                stage
            }
        };
        info!(order_number = %order.order_number(), ?stage, "order placed");

        Ok(PlacementReceipt {
            order,
            stage,
            reduction,
        })
    }

    pub fn get_all_orders(&self) -> Vec<Order> {
        self.orders.list()
    }

    pub fn get_order_by_id(&self, id: RecordId) -> DomainResult<Order> {
        self.orders.get(&id).ok_or_else(|| order_not_found(id))
    }

    pub fn delete_order_by_id(&self, id: RecordId) -> DomainResult<Order> {
        let removed = self.orders.remove(&id).ok_or_else(|| order_not_found(id))?;
        info!(id = %id, order_number = %removed.order_number(), "order deleted");
        Ok(removed)
    }
}
