use crate::classify::{EnrichedOperation, PaymentStatus};
use crate::utils::collation_key;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Days-until-due windows selectable as a risk filter. Only operations that
/// are open and not yet overdue can match one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RiskBucket {
    #[serde(rename = "0-7")]
    Days0To7,
    #[serde(rename = "8-15")]
    Days8To15,
    #[serde(rename = "16-30")]
    Days16To30,
}

impl RiskBucket {
    pub fn label(&self) -> &'static str {
        match self {
            RiskBucket::Days0To7 => "0-7",
            RiskBucket::Days8To15 => "8-15",
            RiskBucket::Days16To30 => "16-30",
        }
    }

    pub fn contains(&self, days_until_due: u32) -> bool {
        match self {
            RiskBucket::Days0To7 => days_until_due <= 7,
            RiskBucket::Days8To15 => (8..=15).contains(&days_until_due),
            RiskBucket::Days16To30 => (16..=30).contains(&days_until_due),
        }
    }
}

/// Filter parameters for one selection call. Immutable by convention: build a
/// new value per call instead of mutating shared state. All present criteria
/// must pass; within `risk_buckets` membership in any one window suffices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationFilter {
    #[serde(default)]
    #[schemars(description = "Keep only operations of this clinic")]
    pub clinica_id: Option<String>,

    #[serde(default)]
    #[schemars(description = "Keep only operations with this status; absent means todos")]
    pub status: Option<PaymentStatus>,

    #[serde(default)]
    #[schemars(description = "Keep only open, not-yet-overdue operations due inside one of these windows")]
    pub risk_buckets: Vec<RiskBucket>,
}

impl OperationFilter {
    pub fn matches(&self, operation: &EnrichedOperation, today: NaiveDate) -> bool {
        if let Some(clinic) = &self.clinica_id {
            if operation.clinica_id() != clinic {
                return false;
            }
        }

        if let Some(status) = self.status {
            if operation.status != status {
                return false;
            }
        }

        if !self.risk_buckets.is_empty() {
            if operation.status != PaymentStatus::EmAberto {
                return false;
            }
            let days = match operation.days_until_due(today) {
                Some(days) => days,
                None => return false,
            };
            if !self.risk_buckets.iter().any(|bucket| bucket.contains(days)) {
                return false;
            }
        }

        true
    }
}

/// Sortable columns. Wire values match the field names they sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Id,
    ClinicaId,
    Cnpj,
    DataAntecipacao,
    DataReembolsoProgramada,
    DataPagamentoReembolso,
    ValorLiquido,
    ValorTaxa,
    ValorAPagar,
    Status,
    DiasAtraso,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flipped(&self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One sort instruction. `toggled` reproduces the header-click behavior:
/// clicking the active column flips its direction, clicking another column
/// starts over ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        SortSpec {
            key,
            direction: SortDirection::Ascending,
        }
    }

    pub fn toggled(&self, key: SortKey) -> SortSpec {
        if self.key == key {
            SortSpec {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            SortSpec::ascending(key)
        }
    }

    /// Compares two operations under this key and direction. Missing values
    /// sort last in both directions; present values honor the direction.
    /// Strings compare through the accent-folded collation key.
    pub fn compare(&self, a: &EnrichedOperation, b: &EnrichedOperation) -> Ordering {
        match self.key {
            SortKey::Id => self.by_string(a.operation.id.as_deref(), b.operation.id.as_deref()),
            SortKey::ClinicaId => {
                self.by_string(Some(a.clinica_id()), Some(b.clinica_id()))
            }
            SortKey::Cnpj => {
                self.by_string(a.operation.cnpj.as_deref(), b.operation.cnpj.as_deref())
            }
            SortKey::DataAntecipacao => {
                self.by_ord(a.operation.advance_date(), b.operation.advance_date())
            }
            SortKey::DataReembolsoProgramada => {
                self.by_ord(a.scheduled_refund_date(), b.scheduled_refund_date())
            }
            SortKey::DataPagamentoReembolso => {
                self.by_ord(a.actual_refund_date(), b.actual_refund_date())
            }
            SortKey::ValorLiquido => {
                self.by_number(a.operation.valor_liquido, b.operation.valor_liquido)
            }
            SortKey::ValorTaxa => self.by_number(a.operation.valor_taxa, b.operation.valor_taxa),
            SortKey::ValorAPagar => {
                self.by_number(a.operation.valor_a_pagar, b.operation.valor_a_pagar)
            }
            SortKey::Status => {
                self.by_string(Some(a.status.label()), Some(b.status.label()))
            }
            SortKey::DiasAtraso => self.by_ord(Some(a.dias_atraso), Some(b.dias_atraso)),
        }
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    fn by_ord<T: Ord>(&self, a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => self.directed(x.cmp(&y)),
        }
    }

    fn by_number(&self, a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                self.directed(x.partial_cmp(&y).unwrap_or(Ordering::Equal))
            }
        }
    }

    fn by_string(&self, a: Option<&str>, b: Option<&str>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => self.directed(collation_key(x).cmp(&collation_key(y))),
        }
    }
}

/// Applies the filter and, when allowed, the sort, returning a fresh list.
///
/// An active risk-bucket filter suppresses sorting and the result keeps
/// filter-pass order; this mirrors the long-standing behavior of the screen
/// this engine replaced, and a regression test pins it.
pub fn select(
    operations: &[EnrichedOperation],
    filter: &OperationFilter,
    sort: Option<&SortSpec>,
    today: NaiveDate,
) -> Vec<EnrichedOperation> {
    let mut rows: Vec<EnrichedOperation> = operations
        .iter()
        .filter(|op| filter.matches(op, today))
        .cloned()
        .collect();

    if filter.risk_buckets.is_empty() {
        if let Some(spec) = sort {
            rows.sort_by(|a, b| spec.compare(a, b));
        }
    }

    rows
}
