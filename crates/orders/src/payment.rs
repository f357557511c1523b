//! Payment methods, proof-of-payment validation, and payment state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use couture_core::{DomainError, DomainResult};

/// Accepted payment methods.
///
/// Everything except cash-on-delivery is a receipt-based bank/wallet transfer
/// that an admin verifies manually against the uploaded receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    BankTransfer,
    Jazzcash,
    Easypaisa,
    Cod,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::Jazzcash => "jazzcash",
            PaymentMethod::Easypaisa => "easypaisa",
            PaymentMethod::Cod => "cod",
        }
    }

    /// Receipt-based methods require proof of the full transfer up front.
    pub fn requires_receipt(self) -> bool {
        !matches!(self, PaymentMethod::Cod)
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification state of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Failed,
    Refunded,
}

/// Proof of payment submitted with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    /// Bank/wallet transaction reference quoted by the customer.
    pub transaction_id: Option<String>,
    /// Reference to the uploaded receipt image.
    pub receipt_reference: Option<String>,
    /// Advance paid for cash-on-delivery orders, in rupees.
    pub advance_amount: Option<u64>,
}

impl PaymentDetails {
    /// Check that the submitted proof matches what the method requires.
    ///
    /// Receipt-based methods need both a transaction id and a receipt; COD
    /// needs an advance payment, which itself comes with a receipt.
    pub fn validate_proof(&self) -> DomainResult<()> {
        let missing = |what: &str| {
            DomainError::missing_payment_proof(format!(
                "{what} is required for {} payments",
                self.method
            ))
        };

        match self.method {
            PaymentMethod::BankTransfer | PaymentMethod::Jazzcash | PaymentMethod::Easypaisa => {
                if blank(&self.transaction_id) {
                    return Err(missing("a transaction id"));
                }
                if blank(&self.receipt_reference) {
                    return Err(missing("a payment receipt"));
                }
            }
            PaymentMethod::Cod => {
                if self.advance_amount.is_none_or(|a| a == 0) {
                    return Err(missing("an advance payment"));
                }
                if blank(&self.receipt_reference) {
                    return Err(missing("the advance payment receipt"));
                }
            }
        }
        Ok(())
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Payment state carried on the order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub receipt_reference: Option<String>,
    pub advance_amount: Option<u64>,
    /// Admin who approved the payment, once verified.
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl PaymentInfo {
    pub fn pending(details: PaymentDetails) -> Self {
        Self {
            method: details.method,
            status: PaymentStatus::Pending,
            transaction_id: details.transaction_id,
            receipt_reference: details.receipt_reference,
            advance_amount: details.advance_amount,
            verified_by: None,
            verified_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.status == PaymentStatus::Verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_transfer() -> PaymentDetails {
        PaymentDetails {
            method: PaymentMethod::BankTransfer,
            transaction_id: Some("TXN-889123".into()),
            receipt_reference: Some("receipts/889123.jpg".into()),
            advance_amount: None,
        }
    }

    #[test]
    fn full_bank_transfer_proof_is_accepted() {
        assert!(bank_transfer().validate_proof().is_ok());
    }

    #[test]
    fn bank_transfer_without_receipt_is_rejected() {
        let details = PaymentDetails {
            receipt_reference: None,
            ..bank_transfer()
        };
        let err = details.validate_proof().unwrap_err();
        assert!(err.to_string().contains("receipt"), "{err}");
    }

    #[test]
    fn whitespace_transaction_id_counts_as_missing() {
        let details = PaymentDetails {
            transaction_id: Some("   ".into()),
            ..bank_transfer()
        };
        assert!(details.validate_proof().is_err());
    }

    #[test]
    fn cod_requires_advance_and_its_receipt() {
        let no_advance = PaymentDetails {
            method: PaymentMethod::Cod,
            transaction_id: None,
            receipt_reference: Some("receipts/adv.jpg".into()),
            advance_amount: None,
        };
        assert!(no_advance.validate_proof().is_err());

        let no_receipt = PaymentDetails {
            method: PaymentMethod::Cod,
            transaction_id: None,
            receipt_reference: None,
            advance_amount: Some(2000),
        };
        let err = no_receipt.validate_proof().unwrap_err();
        assert!(err.to_string().contains("receipt"), "{err}");

        let complete = PaymentDetails {
            method: PaymentMethod::Cod,
            transaction_id: None,
            receipt_reference: Some("receipts/adv.jpg".into()),
            advance_amount: Some(2000),
        };
        assert!(complete.validate_proof().is_ok());
    }

    #[test]
    fn cod_does_not_need_a_transaction_id() {
        let details = PaymentDetails {
            method: PaymentMethod::Cod,
            transaction_id: None,
            receipt_reference: Some("receipts/adv.jpg".into()),
            advance_amount: Some(1500),
        };
        assert!(details.validate_proof().is_ok());
    }
}
