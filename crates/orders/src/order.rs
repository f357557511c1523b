//! The order aggregate: placement, payment verification, status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use couture_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use couture_events::Event;
use couture_pricing::Totals;

use crate::number::OrderNumber;
use crate::payment::{PaymentDetails, PaymentInfo, PaymentStatus};
use crate::status::OrderStatus;
use crate::types::{
    CustomOrderDetails, CustomerInfo, OrderItem, Priority, ShippingAddress, StatusHistoryItem,
};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: a placed order.
///
/// All money amounts are frozen at placement time; the catalog can change
/// freely afterwards without affecting existing orders.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    id: OrderId,
    order_number: Option<OrderNumber>,
    items: Vec<OrderItem>,
    customer: Option<CustomerInfo>,
    shipping_address: Option<ShippingAddress>,
    payment: Option<PaymentInfo>,
    pricing: Totals,
    status: OrderStatus,
    history: Vec<StatusHistoryItem>,
    custom: Option<CustomOrderDetails>,
    priority: Priority,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: None,
            items: Vec::new(),
            customer: None,
            shipping_address: None,
            payment: None,
            pricing: Totals::default(),
            status: OrderStatus::PendingPayment,
            history: Vec::new(),
            custom: None,
            priority: Priority::Normal,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.order_number.as_ref()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn customer(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentInfo> {
        self.payment.as_ref()
    }

    pub fn pricing(&self) -> Totals {
        self.pricing
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Append-only audit trail of every status the order has held.
    pub fn history(&self) -> &[StatusHistoryItem] {
        &self.history
    }

    pub fn custom(&self) -> Option<&CustomOrderDetails> {
        self.custom.as_ref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn is_custom(&self) -> bool {
        self.custom.is_some()
    }

    pub fn exists(&self) -> bool {
        self.created
    }

    fn payment_verified(&self) -> bool {
        self.payment.as_ref().is_some_and(PaymentInfo::is_verified)
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub items: Vec<OrderItem>,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentDetails,
    pub pricing: Totals,
    pub custom: Option<CustomOrderDetails>,
    pub priority: Priority,
    pub occurred_at: DateTime<Utc>,
}

/// Command: VerifyPayment. `amount` is what the admin read off the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPayment {
    pub order_id: OrderId,
    pub verified_by: String,
    pub amount: Option<u64>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectPayment {
    pub order_id: OrderId,
    pub rejected_by: String,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateStatus.
///
/// A populated `override_reason` lets an admin force a transition the state
/// machine would normally refuse; the reason lands in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub order_id: OrderId,
    pub to: OrderStatus,
    pub actor: String,
    pub note: Option<String>,
    pub override_reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    VerifyPayment(VerifyPayment),
    RejectPayment(RejectPayment),
    UpdateStatus(UpdateStatus),
}

/// Receipt amount differing from the order total. Recorded as a warning on
/// the verification, never a blocker; partial advances are a known pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountMismatch {
    pub submitted: u64,
    pub expected: u64,
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub items: Vec<OrderItem>,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentDetails,
    pub pricing: Totals,
    pub custom: Option<CustomOrderDetails>,
    pub priority: Priority,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentVerified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerified {
    pub order_id: OrderId,
    pub verified_by: String,
    pub amount_mismatch: Option<AmountMismatch>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRejected {
    pub order_id: OrderId,
    pub rejected_by: String,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: String,
    pub note: Option<String>,
    pub override_reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    PaymentVerified(PaymentVerified),
    PaymentRejected(PaymentRejected),
    StatusChanged(StatusChanged),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.placed",
            OrderEvent::PaymentVerified(_) => "orders.payment_verified",
            OrderEvent::PaymentRejected(_) => "orders.payment_rejected",
            OrderEvent::StatusChanged(_) => "orders.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::PaymentVerified(e) => e.occurred_at,
            OrderEvent::PaymentRejected(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.order_number = Some(e.order_number.clone());
                self.items = e.items.clone();
                self.customer = Some(e.customer.clone());
                self.shipping_address = Some(e.shipping_address.clone());
                self.payment = Some(PaymentInfo::pending(e.payment.clone()));
                self.pricing = e.pricing;
                self.custom = e.custom.clone();
                self.priority = e.priority;
                self.status = OrderStatus::PendingPayment;
                self.history.push(StatusHistoryItem {
                    status: OrderStatus::PendingPayment,
                    at: e.occurred_at,
                    actor: "customer".to_string(),
                    note: None,
                });
                self.created = true;
            }
            OrderEvent::PaymentVerified(e) => {
                if let Some(payment) = &mut self.payment {
                    payment.status = PaymentStatus::Verified;
                    payment.verified_by = Some(e.verified_by.clone());
                    payment.verified_at = Some(e.occurred_at);
                }
                self.status = OrderStatus::PaymentVerified;
                self.history.push(StatusHistoryItem {
                    status: OrderStatus::PaymentVerified,
                    at: e.occurred_at,
                    actor: e.verified_by.clone(),
                    note: e.amount_mismatch.map(|m| {
                        format!(
                            "receipt amount {} differs from order total {}",
                            m.submitted, m.expected
                        )
                    }),
                });
            }
            OrderEvent::PaymentRejected(e) => {
                if let Some(payment) = &mut self.payment {
                    payment.status = PaymentStatus::Failed;
                }
                // Status stays pending-payment; the customer can resubmit proof.
                self.history.push(StatusHistoryItem {
                    status: OrderStatus::PendingPayment,
                    at: e.occurred_at,
                    actor: e.rejected_by.clone(),
                    note: Some(format!("payment rejected: {}", e.reason)),
                });
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                if e.to == OrderStatus::Refunded {
                    if let Some(payment) = &mut self.payment {
                        payment.status = PaymentStatus::Refunded;
                    }
                }
                self.history.push(StatusHistoryItem {
                    status: e.to,
                    at: e.occurred_at,
                    actor: e.actor.clone(),
                    note: match (&e.note, &e.override_reason) {
                        (Some(note), Some(reason)) => Some(format!("{note} (override: {reason})")),
                        (None, Some(reason)) => Some(format!("override: {reason}")),
                        (note, None) => note.clone(),
                    },
                });
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::VerifyPayment(cmd) => self.handle_verify(cmd),
            OrderCommand::RejectPayment(cmd) => self.handle_reject(cmd),
            OrderCommand::UpdateStatus(cmd) => self.handle_update_status(cmd),
        }
    }
}

impl Order {
    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }

        if cmd.items.is_empty() && cmd.custom.is_none() {
            return Err(DomainError::validation("cannot place an empty order"));
        }

        let mut missing = Vec::new();
        if cmd.customer.name.trim().is_empty() {
            missing.push("customer name");
        }
        if cmd.customer.email.trim().is_empty() {
            missing.push("customer email");
        }
        if cmd.customer.phone.trim().is_empty() {
            missing.push("customer phone");
        }
        if cmd.shipping_address.line1.trim().is_empty() {
            missing.push("shipping address");
        }
        if cmd.shipping_address.city.trim().is_empty() {
            missing.push("shipping city");
        }
        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        for item in &cmd.items {
            if item.quantity == 0 {
                return Err(DomainError::validation(format!(
                    "quantity for '{}' must be positive",
                    item.title
                )));
            }
        }

        cmd.payment.validate_proof()?;

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            order_number: cmd.order_number.clone(),
            items: cmd.items.clone(),
            customer: cmd.customer.clone(),
            shipping_address: cmd.shipping_address.clone(),
            payment: cmd.payment.clone(),
            pricing: cmd.pricing,
            custom: cmd.custom.clone(),
            priority: cmd.priority,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_verify(&self, cmd: &VerifyPayment) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }

        // Approving an already-approved payment is a no-op, not an error:
        // nothing is appended, so the audit trail cannot grow from retries.
        if self.payment_verified() {
            return Ok(vec![]);
        }

        if self.status != OrderStatus::PendingPayment {
            return Err(DomainError::conflict(format!(
                "cannot verify payment while order is {}",
                self.status
            )));
        }

        let amount_mismatch = cmd.amount.and_then(|submitted| {
            (submitted != self.pricing.total).then_some(AmountMismatch {
                submitted,
                expected: self.pricing.total,
            })
        });

        Ok(vec![OrderEvent::PaymentVerified(PaymentVerified {
            order_id: cmd.order_id,
            verified_by: cmd.verified_by.clone(),
            amount_mismatch,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectPayment) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }

        if self.payment_verified() {
            return Err(DomainError::conflict(
                "payment has already been verified",
            ));
        }

        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("a rejection reason is required"));
        }

        Ok(vec![OrderEvent::PaymentRejected(PaymentRejected {
            order_id: cmd.order_id,
            rejected_by: cmd.rejected_by.clone(),
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_status(&self, cmd: &UpdateStatus) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }

        // The payment gate: no status movement at all, override or not,
        // until an admin has verified the payment.
        if self.status == OrderStatus::PendingPayment && !self.payment_verified() {
            return Err(DomainError::payment_not_verified(
                "payment must be verified before the order status can change",
            ));
        }

        let allowed = self.status.can_transition(cmd.to)
            || (cmd.override_reason.is_some() && self.status.can_override(cmd.to));

        if !allowed {
            return Err(DomainError::invalid_transition(format!(
                "cannot move order from {} to {}",
                self.status, cmd.to
            )));
        }

        Ok(vec![OrderEvent::StatusChanged(StatusChanged {
            order_id: cmd.order_id,
            from: self.status,
            to: cmd.to,
            actor: cmd.actor.clone(),
            note: cmd.note.clone(),
            override_reason: cmd.override_reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
