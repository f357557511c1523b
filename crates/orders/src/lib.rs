//! Order lifecycle domain module (event-sourced).
//!
//! Contains the order aggregate, the status state machine, and the
//! payment-verification workflow, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod number;
pub mod order;
pub mod payment;
pub mod status;
pub mod types;

pub use number::OrderNumber;
pub use order::{
    AmountMismatch, Order, OrderCommand, OrderEvent, OrderId, OrderPlaced, PaymentRejected,
    PaymentVerified, PlaceOrder, RejectPayment, StatusChanged, UpdateStatus, VerifyPayment,
};
pub use payment::{PaymentDetails, PaymentInfo, PaymentMethod, PaymentStatus};
pub use status::OrderStatus;
pub use types::{
    CustomOrderDetails, CustomerInfo, OrderItem, Priority, ShippingAddress, StatusHistoryItem,
};
