use crate::schema::Operation;
use crate::utils::{days_overdue, days_until};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Terminal payment status of an operation. Every operation lands in exactly
/// one of these; the serialized form is the label the presentation layer
/// already renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PaymentStatus {
    #[serde(rename = "Sem vencimento")]
    #[schemars(description = "No scheduled-refund date on record; the operation cannot age")]
    SemVencimento,

    #[serde(rename = "Pago em atraso")]
    #[schemars(description = "Refunded after the scheduled date")]
    PagoEmAtraso,

    #[serde(rename = "Pago no prazo")]
    #[schemars(description = "Refunded on or before the scheduled date")]
    PagoNoPrazo,

    #[serde(rename = "Em atraso")]
    #[schemars(description = "Unpaid and past the scheduled date")]
    EmAtraso,

    #[serde(rename = "Em aberto")]
    #[schemars(description = "Unpaid with the scheduled date still ahead (or today)")]
    EmAberto,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::SemVencimento => "Sem vencimento",
            PaymentStatus::PagoEmAtraso => "Pago em atraso",
            PaymentStatus::PagoNoPrazo => "Pago no prazo",
            PaymentStatus::EmAtraso => "Em atraso",
            PaymentStatus::EmAberto => "Em aberto",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::PagoEmAtraso | PaymentStatus::PagoNoPrazo)
    }

    /// Statuses that count toward a clinic's delinquency exposure: currently
    /// overdue, or paid but paid late.
    pub fn is_delinquent(&self) -> bool {
        matches!(self, PaymentStatus::EmAtraso | PaymentStatus::PagoEmAtraso)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying one operation against a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: PaymentStatus,
    pub dias_atraso: u32,
}

/// Assigns the payment status and delay-in-days for one operation.
///
/// Branches are evaluated in order and exactly one fires:
/// 1. no scheduled date (or an unparseable one) -> `SemVencimento`, delay 0;
/// 2. scheduled and paid -> `PagoEmAtraso` with the positive delay, else
///    `PagoNoPrazo` with 0;
/// 3. scheduled and unpaid -> `EmAtraso` with days past due relative to
///    `today`, else `EmAberto` with 0.
///
/// Pure function of the operation and `today`; never reads the system clock
/// and never fails. Malformed fields degrade to the absent branch.
pub fn classify(operation: &Operation, today: NaiveDate) -> Classification {
    let scheduled = match operation.scheduled_refund_date() {
        Some(date) => date,
        None => {
            return Classification {
                status: PaymentStatus::SemVencimento,
                dias_atraso: 0,
            }
        }
    };

    match operation.actual_refund_date() {
        Some(paid) => {
            let delay = days_overdue(scheduled, paid);
            if delay > 0 {
                Classification {
                    status: PaymentStatus::PagoEmAtraso,
                    dias_atraso: delay,
                }
            } else {
                Classification {
                    status: PaymentStatus::PagoNoPrazo,
                    dias_atraso: 0,
                }
            }
        }
        None => {
            let delay = days_overdue(scheduled, today);
            if delay > 0 {
                Classification {
                    status: PaymentStatus::EmAtraso,
                    dias_atraso: delay,
                }
            } else {
                Classification {
                    status: PaymentStatus::EmAberto,
                    dias_atraso: 0,
                }
            }
        }
    }
}

/// An operation together with its computed status. The input record is
/// embedded untouched; enrichment always works on a copy.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedOperation {
    #[serde(flatten)]
    pub operation: Operation,
    pub status: PaymentStatus,
    pub dias_atraso: u32,
}

impl EnrichedOperation {
    pub fn new(operation: Operation, today: NaiveDate) -> Self {
        let classification = classify(&operation, today);
        EnrichedOperation {
            operation,
            status: classification.status,
            dias_atraso: classification.dias_atraso,
        }
    }

    pub fn clinica_id(&self) -> &str {
        &self.operation.clinica_id
    }

    pub fn net_value(&self) -> f64 {
        self.operation.net_value()
    }

    pub fn scheduled_refund_date(&self) -> Option<NaiveDate> {
        self.operation.scheduled_refund_date()
    }

    pub fn actual_refund_date(&self) -> Option<NaiveDate> {
        self.operation.actual_refund_date()
    }

    /// Days from `today` until the scheduled date, for operations that have
    /// one. Floored at zero, so an overdue operation reports 0.
    pub fn days_until_due(&self, today: NaiveDate) -> Option<u32> {
        self.scheduled_refund_date()
            .map(|due| days_until(today, due))
    }
}

/// Classifies a whole batch, preserving input order. Fresh output on every
/// call; nothing is cached across batches.
pub fn classify_batch(operations: &[Operation], today: NaiveDate) -> Vec<EnrichedOperation> {
    operations
        .iter()
        .map(|operation| EnrichedOperation::new(operation.clone(), today))
        .collect()
}
