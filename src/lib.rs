//! # Receivables Aging Engine
//!
//! A library for classifying clinic cash-advance ("antecipação") operations
//! by payment status and deriving receivables-aging statistics: overdue and
//! upcoming-due bucket histograms, open/paid totals, per-clinic delinquency
//! ratios and a top-delinquent ranking.
//!
//! ## Core Concepts
//!
//! - **Operation**: one cash advance against a clinic's future receivables, with a scheduled refund date and optionally an actual one
//! - **Classification**: every operation lands in exactly one of five payment statuses, with a non-negative delay in days
//! - **Aging buckets**: overdue and upcoming amounts grouped into fixed day ranges for risk reporting
//! - **Delinquency**: a clinic's overdue exposure, as an amount and as a share of its total volume
//! - **Snapshot semantics**: every run recomputes the whole result set from the batch; nothing is cached across batches
//!
//! ## Example
//!
//! ```rust,ignore
//! use receivables_aging_engine::*;
//! use chrono::NaiveDate;
//!
//! let batch = ReceivablesBatch::from_json(&raw_json)?;
//! let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
//!
//! let snapshot = process_receivables(&batch.operations, &batch.clinics, today);
//!
//! println!("open and overdue: {}", snapshot.stats.aberto_vencido);
//! for clinic in &snapshot.ranking {
//!     println!("{} -> {}", clinic.clinica_id, clinic.valor_atraso);
//! }
//!
//! let filter = OperationFilter {
//!     status: Some(PaymentStatus::EmAtraso),
//!     ..OperationFilter::default()
//! };
//! let sort = SortSpec::ascending(SortKey::DataReembolsoProgramada);
//! let rows = select(&snapshot.operations, &filter, Some(&sort), today);
//! ```

pub mod aging;
pub mod classify;
pub mod error;
pub mod ingestion;
pub mod limits;
pub mod schema;
pub mod summary;
pub mod utils;
pub mod view;

pub use aging::{
    aggregate, per_clinic, top_delinquent, AgingStats, ClinicTotals, OverdueHistogram,
    RankedClinic, UpcomingHistogram, UpcomingSlot, DEFAULT_RANKING_SIZE,
};
pub use classify::{classify, classify_batch, Classification, EnrichedOperation, PaymentStatus};
pub use error::{ReceivablesError, Result};
pub use ingestion::*;
pub use limits::*;
pub use schema::*;
pub use summary::*;
pub use utils::*;
pub use view::{select, OperationFilter, RiskBucket, SortDirection, SortKey, SortSpec};

use chrono::NaiveDate;
use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything one pipeline run derives from a batch. Built fresh on every
/// call; callers rebuild it whenever the batch changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesSnapshot {
    /// The full classified operation set, in input order.
    pub operations: Vec<EnrichedOperation>,
    /// Aggregate aging statistics over the whole batch.
    pub stats: AgingStats,
    /// Raw per-clinic volume and exposure accumulators.
    pub clinics: BTreeMap<String, ClinicTotals>,
    /// Per-clinic delinquency in the lookup shape views join against.
    pub delinquency: BTreeMap<String, ClinicDelinquency>,
    /// Upstream summary rows with delinquency fields merged in.
    pub summaries: Vec<EnrichedClinicSummary>,
    /// Portfolio-wide totals across the summary rows.
    pub portfolio: PortfolioTotals,
    /// Clinics with delinquent exposure, worst first.
    pub ranking: Vec<RankedClinic>,
}

pub struct ReceivablesProcessor;

impl ReceivablesProcessor {
    /// Runs classification, aggregation and the summary join over one batch.
    ///
    /// Total over its inputs: malformed dates and missing numerics degrade
    /// per record and an empty batch produces an all-zero snapshot, so there
    /// is no error path here.
    pub fn process(
        operations: &[Operation],
        clinics: &[ClinicSummaryRow],
        today: NaiveDate,
    ) -> ReceivablesSnapshot {
        info!(
            "Processing {} operations across {} clinic summaries",
            operations.len(),
            clinics.len()
        );

        let enriched = classify_batch(operations, today);
        let stats = aggregate(&enriched, today);
        let clinic_totals = per_clinic(&enriched);
        let delinquency = delinquency_by_clinic(&clinic_totals);
        let summaries = enrich_summaries(clinics, &clinic_totals);
        let portfolio = portfolio_totals(clinics);
        let ranking = top_delinquent(&enriched, DEFAULT_RANKING_SIZE);

        debug!(
            "Open total {:.2} of which {:.2} overdue; delinquency ratio {:.4}; {} clinics ranked",
            stats.aberto_total,
            stats.aberto_vencido,
            stats.taxa_atraso,
            ranking.len()
        );

        ReceivablesSnapshot {
            operations: enriched,
            stats,
            clinics: clinic_totals,
            delinquency,
            summaries,
            portfolio,
            ranking,
        }
    }
}

pub fn process_receivables(
    operations: &[Operation],
    clinics: &[ClinicSummaryRow],
    today: NaiveDate,
) -> ReceivablesSnapshot {
    ReceivablesProcessor::process(operations, clinics, today)
}
