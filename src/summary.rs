use crate::aging::ClinicTotals;
use crate::schema::ClinicSummaryRow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Delinquency figures for one clinic, keyed by clinic id when published as
/// a map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicDelinquency {
    pub valor_atraso: f64,
    pub perc_atraso: Option<f64>,
}

/// Projects the per-clinic accumulator into the lookup shape the
/// presentation layer joins against.
pub fn delinquency_by_clinic(
    per_clinic: &BTreeMap<String, ClinicTotals>,
) -> BTreeMap<String, ClinicDelinquency> {
    per_clinic
        .iter()
        .map(|(clinica_id, totals)| {
            (
                clinica_id.clone(),
                ClinicDelinquency {
                    valor_atraso: totals.overdue_total,
                    perc_atraso: totals.perc_atraso(),
                },
            )
        })
        .collect()
}

/// A summary row with the locally computed delinquency fields merged in.
/// The upstream row passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedClinicSummary {
    #[serde(flatten)]
    pub row: ClinicSummaryRow,
    pub valor_atraso: f64,
    pub perc_atraso: Option<f64>,
}

/// Merges delinquency exposure into each summary row. A clinic with no
/// operations in the batch gets a zero exposure and a null ratio, so "no
/// data" stays distinguishable from "measured clean".
pub fn enrich_summaries(
    rows: &[ClinicSummaryRow],
    per_clinic: &BTreeMap<String, ClinicTotals>,
) -> Vec<EnrichedClinicSummary> {
    rows.iter()
        .map(|row| {
            let totals = per_clinic.get(&row.clinica_id);
            EnrichedClinicSummary {
                row: row.clone(),
                valor_atraso: totals.map(|t| t.overdue_total).unwrap_or(0.0),
                perc_atraso: totals.and_then(ClinicTotals::perc_atraso),
            }
        })
        .collect()
}

/// Portfolio-wide totals across the given summary rows. Missing fields
/// count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub total_antecipado: f64,
    pub total_reembolsado: f64,
    pub em_aberto: f64,
    pub saldo_antecipavel: f64,
}

pub fn portfolio_totals(rows: &[ClinicSummaryRow]) -> PortfolioTotals {
    let mut totals = PortfolioTotals::default();
    for row in rows {
        totals.total_antecipado += row.total_antecipado.unwrap_or(0.0);
        totals.total_reembolsado += row.total_reembolsado.unwrap_or(0.0);
        totals.em_aberto += row.em_aberto.unwrap_or(0.0);
        totals.saldo_antecipavel += row.saldo_antecipavel.unwrap_or(0.0);
    }
    totals
}
