use crate::error::Result;
use crate::utils::parse_date_lenient;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single cash-advance operation as supplied by the upstream service.
///
/// Field names on the wire are the legacy camelCase Portuguese identifiers.
/// Dates travel as strings because the historical feed mixes ISO dates, ISO
/// datetimes and `DD/MM/YYYY`; they are parsed leniently at the point of use
/// and a value that fails to parse is treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[schemars(description = "Opaque operation identifier, when the source system assigns one")]
    pub id: Option<String>,

    #[schemars(description = "Identifier of the clinic that received the advance")]
    pub clinica_id: String,

    #[schemars(description = "CNPJ of the clinic as printed on the source document")]
    pub cnpj: Option<String>,

    #[schemars(description = "Net amount advanced to the clinic, in BRL")]
    pub valor_liquido: Option<f64>,

    #[schemars(description = "Fee charged on the advance, in BRL")]
    pub valor_taxa: Option<f64>,

    #[schemars(description = "Gross amount the clinic must repay, in BRL")]
    pub valor_a_pagar: Option<f64>,

    #[schemars(description = "Date the advance was disbursed")]
    pub data_antecipacao: Option<String>,

    #[schemars(description = "Date the refund is contractually due")]
    pub data_reembolso_programada: Option<String>,

    #[schemars(description = "Date the refund was actually paid, when it has been")]
    pub data_pagamento_reembolso: Option<String>,

    #[schemars(
        description = "Older records carry the paid-refund date under this name instead of dataPagamentoReembolso"
    )]
    pub data_reembolso: Option<String>,
}

impl Operation {
    /// Net value with the missing-numeric policy applied: absent means 0.
    pub fn net_value(&self) -> f64 {
        self.valor_liquido.unwrap_or(0.0)
    }

    pub fn advance_date(&self) -> Option<NaiveDate> {
        parse_field_date(self.data_antecipacao.as_deref())
    }

    pub fn scheduled_refund_date(&self) -> Option<NaiveDate> {
        parse_field_date(self.data_reembolso_programada.as_deref())
    }

    /// Resolves the actual-refund date across the record-shape migration:
    /// the first non-empty of `dataPagamentoReembolso` then `dataReembolso`
    /// is taken, and only that one value is parsed. A malformed value in the
    /// newer field therefore shadows the legacy field.
    pub fn actual_refund_date(&self) -> Option<NaiveDate> {
        let raw = non_empty(self.data_pagamento_reembolso.as_deref())
            .or_else(|| non_empty(self.data_reembolso.as_deref()));
        raw.and_then(parse_date_lenient)
    }

    /// True when no actual-refund date resolves (see `actual_refund_date`).
    pub fn is_unpaid(&self) -> bool {
        self.actual_refund_date().is_none()
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_field_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_date_lenient)
}

/// Per-clinic totals the upstream service has already aggregated, plus the
/// clinic's identity. The engine only reads these; `valorAtraso` and
/// `percAtraso` are merged in locally (see `summary`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicSummaryRow {
    #[schemars(description = "Identifier of the clinic this row describes")]
    pub clinica_id: String,

    #[schemars(description = "Display name of the clinic")]
    pub nome: Option<String>,

    #[schemars(description = "CNPJ of the clinic")]
    pub cnpj: Option<String>,

    #[schemars(description = "Lifetime amount advanced to this clinic, in BRL")]
    pub total_antecipado: Option<f64>,

    #[schemars(description = "Lifetime amount already refunded by this clinic, in BRL")]
    pub total_reembolsado: Option<f64>,

    #[schemars(description = "Amount currently outstanding, in BRL")]
    pub em_aberto: Option<f64>,

    #[schemars(description = "Receivables balance still eligible for anticipation, in BRL")]
    pub saldo_antecipavel: Option<f64>,

    #[schemars(description = "Credit limit approved for this clinic, in BRL")]
    pub limite_aprovado: Option<f64>,
}

/// The full input batch the engine runs against: every operation plus one
/// summary row per clinic. This is the shape published to the upstream
/// collaborator as a JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesBatch {
    #[schemars(description = "All anticipation operations in the current data set")]
    pub operations: Vec<Operation>,

    #[schemars(description = "One pre-aggregated summary row per clinic")]
    pub clinics: Vec<ClinicSummaryRow>,
}

impl ReceivablesBatch {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReceivablesBatch)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
