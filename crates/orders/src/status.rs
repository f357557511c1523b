//! The order status state machine.
//!
//! All transition validation lives in this one table; the aggregate, the
//! admin routes, and any UI guard consult it rather than re-encoding the
//! rules locally.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use couture_core::DomainError;

/// Order status.
///
/// Linear happy path from `PendingPayment` through `Delivered`, with
/// `Cancelled` reachable from any non-terminal state and `Refunded` reachable
/// from `Delivered` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    PendingPayment,
    PaymentVerified,
    MaterialArranged,
    InProgress,
    QualityCheck,
    ReadyDispatch,
    Dispatched,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending-payment",
            OrderStatus::PaymentVerified => "payment-verified",
            OrderStatus::MaterialArranged => "material-arranged",
            OrderStatus::InProgress => "in-progress",
            OrderStatus::QualityCheck => "quality-check",
            OrderStatus::ReadyDispatch => "ready-dispatch",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Position in the linear production chain, if the status is on it.
    fn chain_rank(self) -> Option<u8> {
        match self {
            OrderStatus::PendingPayment => Some(0),
            OrderStatus::PaymentVerified => Some(1),
            OrderStatus::MaterialArranged => Some(2),
            OrderStatus::InProgress => Some(3),
            OrderStatus::QualityCheck => Some(4),
            OrderStatus::ReadyDispatch => Some(5),
            OrderStatus::Dispatched => Some(6),
            OrderStatus::Delivered => Some(7),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    /// No transitions leave a terminal status, not even with an override.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Refunded)
    }

    /// Whether a regular (non-override) transition from `self` to `to` is
    /// allowed.
    ///
    /// Forward moves along the chain may skip stages (the floor does not
    /// always report every step); backward moves are never regular.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        if self == to || self.is_terminal() {
            return false;
        }

        match to {
            OrderStatus::Cancelled => !matches!(
                self,
                OrderStatus::Delivered | OrderStatus::Refunded | OrderStatus::Cancelled
            ),
            OrderStatus::Refunded => {
                matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
            }
            _ => match (self.chain_rank(), to.chain_rank()) {
                (Some(from_rank), Some(to_rank)) => to_rank > from_rank,
                _ => false,
            },
        }
    }

    /// Whether an explicitly logged administrative override may force the
    /// transition. Overrides can walk an order backward or pull a cancelled
    /// order back into production; they still cannot leave `Refunded`.
    pub fn can_override(self, to: OrderStatus) -> bool {
        self != to && !self.is_terminal()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending-payment" => Ok(OrderStatus::PendingPayment),
            "payment-verified" => Ok(OrderStatus::PaymentVerified),
            "material-arranged" => Ok(OrderStatus::MaterialArranged),
            "in-progress" => Ok(OrderStatus::InProgress),
            "quality-check" => Ok(OrderStatus::QualityCheck),
            "ready-dispatch" => Ok(OrderStatus::ReadyDispatch),
            "dispatched" => Ok(OrderStatus::Dispatched),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const CHAIN: [OrderStatus; 8] = [
        PendingPayment,
        PaymentVerified,
        MaterialArranged,
        InProgress,
        QualityCheck,
        ReadyDispatch,
        Dispatched,
        Delivered,
    ];

    #[test]
    fn each_chain_step_is_allowed() {
        for pair in CHAIN.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn forward_skips_are_allowed() {
        assert!(PaymentVerified.can_transition(InProgress));
        assert!(PaymentVerified.can_transition(Delivered));
    }

    #[test]
    fn backward_moves_are_rejected() {
        assert!(!InProgress.can_transition(PaymentVerified));
        assert!(!Delivered.can_transition(Dispatched));
        assert!(!PaymentVerified.can_transition(PendingPayment));
    }

    #[test]
    fn cancelled_is_reachable_from_any_non_terminal_state() {
        for from in CHAIN.iter().take(7) {
            assert!(from.can_transition(Cancelled), "{from} -> cancelled");
        }
        assert!(!Delivered.can_transition(Cancelled));
        assert!(!Refunded.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Cancelled));
    }

    #[test]
    fn refunded_is_reachable_only_from_delivered_or_cancelled() {
        assert!(Delivered.can_transition(Refunded));
        assert!(Cancelled.can_transition(Refunded));
        assert!(!InProgress.can_transition(Refunded));
        assert!(!PendingPayment.can_transition(Refunded));
    }

    #[test]
    fn nothing_leaves_refunded() {
        for to in CHAIN {
            assert!(!Refunded.can_transition(to));
            assert!(!Refunded.can_override(to));
        }
    }

    #[test]
    fn override_permits_backward_moves() {
        assert!(InProgress.can_override(PaymentVerified));
        assert!(Cancelled.can_override(InProgress));
        assert!(!InProgress.can_override(InProgress));
    }

    #[test]
    fn status_strings_round_trip() {
        for s in [
            PendingPayment,
            PaymentVerified,
            MaterialArranged,
            InProgress,
            QualityCheck,
            ReadyDispatch,
            Dispatched,
            Delivered,
            Cancelled,
            Refunded,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
        }
    }
}
