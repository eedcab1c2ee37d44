use crate::classify::{EnrichedOperation, PaymentStatus};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// How many clinics the delinquency ranking keeps.
pub const DEFAULT_RANKING_SIZE: usize = 5;

/// Overdue amounts bucketed by days past due. Buckets close on the upper
/// bound: day 7 lands in `ate_7`, day 15 in `ate_15`, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverdueHistogram {
    pub ate_7: f64,
    pub ate_15: f64,
    pub ate_30: f64,
    pub ate_60: f64,
    pub acima_60: f64,
}

impl OverdueHistogram {
    fn add(&mut self, days_overdue: u32, value: f64) {
        if days_overdue <= 7 {
            self.ate_7 += value;
        } else if days_overdue <= 15 {
            self.ate_15 += value;
        } else if days_overdue <= 30 {
            self.ate_30 += value;
        } else if days_overdue <= 60 {
            self.ate_60 += value;
        } else {
            self.acima_60 += value;
        }
    }

    pub fn total(&self) -> f64 {
        self.ate_7 + self.ate_15 + self.ate_30 + self.ate_60 + self.acima_60
    }
}

/// Amount and operation count falling due inside one upcoming window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingSlot {
    pub valor: f64,
    pub quantidade: u32,
}

/// Open amounts bucketed by days until due, mirroring `OverdueHistogram`.
/// The first bucket starts at zero because an operation due today is still
/// on time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingHistogram {
    pub ate_7: UpcomingSlot,
    pub ate_15: UpcomingSlot,
    pub ate_30: UpcomingSlot,
    pub ate_60: UpcomingSlot,
    pub acima_60: UpcomingSlot,
}

impl UpcomingHistogram {
    fn add(&mut self, days_until_due: u32, value: f64) {
        let slot = if days_until_due <= 7 {
            &mut self.ate_7
        } else if days_until_due <= 15 {
            &mut self.ate_15
        } else if days_until_due <= 30 {
            &mut self.ate_30
        } else if days_until_due <= 60 {
            &mut self.ate_60
        } else {
            &mut self.acima_60
        };
        slot.valor += value;
        slot.quantidade += 1;
    }

    pub fn total(&self) -> f64 {
        self.ate_7.valor
            + self.ate_15.valor
            + self.ate_30.valor
            + self.ate_60.valor
            + self.acima_60.valor
    }

    pub fn count(&self) -> u32 {
        self.ate_7.quantidade
            + self.ate_15.quantidade
            + self.ate_30.quantidade
            + self.ate_60.quantidade
            + self.acima_60.quantidade
    }
}

/// The aggregate snapshot over one classified batch. Rebuilt wholesale on
/// every batch change; amounts are raw BRL decimals, rounding is left to the
/// presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgingStats {
    pub aberto_total: f64,
    pub aberto_vencido: f64,
    pub aberto_em_dia: f64,
    pub aberto_sem_venc: f64,
    pub pago_atraso: f64,
    pub pago_no_prazo: f64,

    pub qtd_aberto: u32,
    pub qtd_vencido: u32,
    pub qtd_em_dia: u32,
    pub qtd_sem_venc: u32,
    pub qtd_pago_atraso: u32,
    pub qtd_pago_no_prazo: u32,

    /// Share of due-dated open volume that is already overdue; 0 when there
    /// is no due-dated open volume at all.
    pub taxa_atraso: f64,
    /// Open amount falling due within 30 days of the reference date.
    pub previsto_30: f64,
    /// Open amount falling due within 60 days of the reference date.
    pub previsto_60: f64,
    /// Mean delay among operations that were paid late; 0 when none were.
    pub atraso_medio_dias: f64,

    pub vencido_por_faixa: OverdueHistogram,
    pub a_vencer_por_faixa: UpcomingHistogram,
}

/// Folds one classified batch into an `AgingStats` snapshot in a single pass.
///
/// Unpaid operations feed the open totals and one of the two histograms
/// depending on where their scheduled date sits relative to `today`; paid
/// operations feed the on-time/late totals. A paid operation that never had a
/// scheduled date counts as paid on time, since it has no delay to measure.
pub fn aggregate(operations: &[EnrichedOperation], today: NaiveDate) -> AgingStats {
    let mut stats = AgingStats::default();
    let mut delay_sum: u64 = 0;

    for op in operations {
        let value = op.net_value();

        if op.operation.is_unpaid() {
            stats.aberto_total += value;
            stats.qtd_aberto += 1;

            match op.status {
                PaymentStatus::EmAtraso => {
                    stats.aberto_vencido += value;
                    stats.qtd_vencido += 1;
                    stats.vencido_por_faixa.add(op.dias_atraso, value);
                }
                PaymentStatus::EmAberto => {
                    stats.aberto_em_dia += value;
                    stats.qtd_em_dia += 1;
                    let days = op.days_until_due(today).unwrap_or(0);
                    stats.a_vencer_por_faixa.add(days, value);
                }
                _ => {
                    stats.aberto_sem_venc += value;
                    stats.qtd_sem_venc += 1;
                }
            }
        } else if op.status == PaymentStatus::PagoEmAtraso {
            stats.pago_atraso += value;
            stats.qtd_pago_atraso += 1;
            delay_sum += u64::from(op.dias_atraso);
        } else {
            stats.pago_no_prazo += value;
            stats.qtd_pago_no_prazo += 1;
        }
    }

    let due_dated_open = stats.aberto_vencido + stats.aberto_em_dia;
    stats.taxa_atraso = if due_dated_open != 0.0 {
        stats.aberto_vencido / due_dated_open
    } else {
        0.0
    };

    let upcoming = &stats.a_vencer_por_faixa;
    stats.previsto_30 = upcoming.ate_7.valor + upcoming.ate_15.valor + upcoming.ate_30.valor;
    stats.previsto_60 = stats.previsto_30 + upcoming.ate_60.valor;

    stats.atraso_medio_dias = if stats.qtd_pago_atraso > 0 {
        delay_sum as f64 / f64::from(stats.qtd_pago_atraso)
    } else {
        0.0
    };

    stats
}

/// Total and delinquent value accumulated for one clinic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicTotals {
    pub total: f64,
    pub overdue_total: f64,
}

impl ClinicTotals {
    /// Delinquent share of the clinic's volume. `None` when the clinic has no
    /// volume at all, which is different from a measured zero.
    pub fn perc_atraso(&self) -> Option<f64> {
        if self.total != 0.0 {
            Some(self.overdue_total / self.total)
        } else {
            None
        }
    }
}

/// Per-clinic volume and delinquency exposure. Delinquent exposure counts
/// operations that are overdue now or were paid late.
pub fn per_clinic(operations: &[EnrichedOperation]) -> BTreeMap<String, ClinicTotals> {
    clinic_totals_ordered(operations).into_iter().collect()
}

/// One row of the delinquency ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedClinic {
    pub clinica_id: String,
    pub valor_atraso: f64,
    /// Delinquent share of the clinic's total volume; `None` when the clinic
    /// has no volume, which is different from a measured zero.
    pub perc_atraso: Option<f64>,
}

/// Clinics ordered by descending delinquent exposure, truncated to `limit`.
/// Clinics with no delinquent exposure do not appear at all, and ties keep
/// the order clinics first appeared in the batch.
pub fn top_delinquent(operations: &[EnrichedOperation], limit: usize) -> Vec<RankedClinic> {
    let mut ranked: Vec<RankedClinic> = clinic_totals_ordered(operations)
        .into_iter()
        .filter(|(_, totals)| totals.overdue_total > 0.0)
        .map(|(clinica_id, totals)| RankedClinic {
            clinica_id,
            valor_atraso: totals.overdue_total,
            perc_atraso: totals.perc_atraso(),
        })
        .collect();

    // Stable sort, so equal exposures stay in first-seen order
    ranked.sort_by(|a, b| {
        b.valor_atraso
            .partial_cmp(&a.valor_atraso)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

fn clinic_totals_ordered(operations: &[EnrichedOperation]) -> Vec<(String, ClinicTotals)> {
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    let mut clinics: Vec<(String, ClinicTotals)> = Vec::new();

    for op in operations {
        let slot = match index.get(op.clinica_id()) {
            Some(&existing) => existing,
            None => {
                index.insert(op.clinica_id().to_string(), clinics.len());
                clinics.push((op.clinica_id().to_string(), ClinicTotals::default()));
                clinics.len() - 1
            }
        };

        let totals = &mut clinics[slot].1;
        totals.total += op.net_value();
        if op.status.is_delinquent() {
            totals.overdue_total += op.net_value();
        }
    }

    clinics
}
