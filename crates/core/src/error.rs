//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Every variant
/// maps to a 4xx at the HTTP boundary and is returned as
/// `{"success": false, "message": ...}`; none of them crash the process.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing or malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Requested quantity exceeds the stock currently available.
    #[error("insufficient stock: only {available} available")]
    InsufficientStock { available: i64 },

    /// Quantity outside the allowed per-line range.
    #[error("quantity must be between {min} and {max}")]
    QuantityOutOfRange { min: u32, max: u32 },

    /// Order progression blocked by the payment-verification gate.
    #[error("payment not verified: {0}")]
    PaymentNotVerified(String),

    /// A status transition not allowed by the state machine.
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    /// Promo code unknown, expired, or not yet valid.
    #[error("invalid promo code: {0}")]
    InvalidPromoCode(String),

    /// Receipt-based payment submitted without the required proof.
    #[error("missing payment proof: {0}")]
    MissingPaymentProof(String),

    /// Payment method outside the accepted set.
    #[error("invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A conflict occurred (e.g. stale version / optimistic concurrency).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Cross-customer access or missing admin role.
    #[error("forbidden")]
    Forbidden,

    /// Authentication failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(available: i64) -> Self {
        Self::InsufficientStock { available }
    }

    pub fn payment_not_verified(msg: impl Into<String>) -> Self {
        Self::PaymentNotVerified(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn invalid_promo_code(msg: impl Into<String>) -> Self {
        Self::InvalidPromoCode(msg.into())
    }

    pub fn missing_payment_proof(msg: impl Into<String>) -> Self {
        Self::MissingPaymentProof(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
