use crate::schema::Operation;
use crate::utils::{digits_only, parse_brl_number, parse_date_lenient};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One row of a partner settlement export. Field names follow the CSV headers
/// those files ship with; everything arrives as text and is normalized during
/// conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOperationRow {
    #[serde(rename = "CNPJ")]
    pub cnpj: String,

    #[serde(rename = "Data Antecipação", default)]
    pub data_antecipacao: Option<String>,

    #[serde(rename = "Data Reembolso", default)]
    pub data_reembolso: Option<String>,

    #[serde(rename = "MoneyDetails_Net", default)]
    pub valor_liquido: Option<String>,

    #[serde(rename = "MoneyDetails_Fee", default)]
    pub valor_taxa: Option<String>,

    #[serde(rename = "MoneyDetails_ToBePaid", default)]
    pub valor_a_pagar: Option<String>,
}

/// Maps CNPJ digits to clinic ids. Keys are reduced to their digits on both
/// sides of the lookup, so formatting differences between the registry and
/// the export never cause a miss.
#[derive(Debug, Clone, Default)]
pub struct ClinicRegistry {
    by_digits: BTreeMap<String, String>,
}

impl ClinicRegistry {
    pub fn new() -> Self {
        ClinicRegistry::default()
    }

    /// Registers one clinic. Entries without any CNPJ digits are ignored.
    pub fn register(&mut self, cnpj: &str, clinica_id: &str) {
        let digits = digits_only(cnpj);
        if !digits.is_empty() {
            self.by_digits.insert(digits, clinica_id.to_string());
        }
    }

    pub fn resolve(&self, cnpj: &str) -> Option<&str> {
        let digits = digits_only(cnpj);
        if digits.is_empty() {
            return None;
        }
        self.by_digits.get(&digits).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_digits.is_empty()
    }
}

/// Result of one conversion pass.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub operations: Vec<Operation>,
    /// Rows dropped because the CNPJ did not resolve or the net value was
    /// missing or unparseable.
    pub skipped: usize,
}

impl ImportOutcome {
    pub fn imported(&self) -> usize {
        self.operations.len()
    }
}

/// Converts raw export rows into normalized operations.
///
/// Numbers are read as Brazilian decimals, dates are accepted in DD/MM/YYYY
/// or ISO form and re-emitted as ISO. A row must resolve to a registered
/// clinic and carry a parseable net value; anything else is skipped and
/// counted, never an error. A missing advance date falls back to `today`.
pub fn convert_rows(
    rows: &[RawOperationRow],
    registry: &ClinicRegistry,
    today: NaiveDate,
) -> ImportOutcome {
    let mut operations = Vec::new();
    let mut skipped = 0;

    for row in rows {
        let clinica_id = match registry.resolve(&row.cnpj) {
            Some(id) => id.to_string(),
            None => {
                skipped += 1;
                continue;
            }
        };

        let valor_liquido = row.valor_liquido.as_deref().and_then(parse_brl_number);
        if valor_liquido.is_none() {
            skipped += 1;
            continue;
        }

        let data_antecipacao = row
            .data_antecipacao
            .as_deref()
            .and_then(parse_date_lenient)
            .unwrap_or(today);

        let data_reembolso = row
            .data_reembolso
            .as_deref()
            .and_then(parse_date_lenient)
            .map(|date| date.format("%Y-%m-%d").to_string());

        operations.push(Operation {
            id: None,
            clinica_id,
            cnpj: Some(row.cnpj.trim().to_string()),
            valor_liquido,
            valor_taxa: row.valor_taxa.as_deref().and_then(parse_brl_number),
            valor_a_pagar: row.valor_a_pagar.as_deref().and_then(parse_brl_number),
            data_antecipacao: Some(data_antecipacao.format("%Y-%m-%d").to_string()),
            data_reembolso_programada: None,
            data_pagamento_reembolso: None,
            data_reembolso,
        });
    }

    debug!(
        "Converted {} of {} rows, skipped {}",
        operations.len(),
        rows.len(),
        skipped
    );

    ImportOutcome {
        operations,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cnpj: &str, net: Option<&str>) -> RawOperationRow {
        RawOperationRow {
            cnpj: cnpj.to_string(),
            data_antecipacao: Some("10/01/2025".to_string()),
            data_reembolso: None,
            valor_liquido: net.map(str::to_string),
            valor_taxa: Some("150,00".to_string()),
            valor_a_pagar: None,
        }
    }

    fn registry() -> ClinicRegistry {
        let mut registry = ClinicRegistry::new();
        registry.register("12.345.678/0001-90", "clinica-norte");
        registry.register("98765432000110", "clinica-sul");
        registry
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn test_registry_ignores_formatting() {
        let registry = registry();
        assert_eq!(registry.resolve("12345678000190"), Some("clinica-norte"));
        assert_eq!(
            registry.resolve("12.345.678/0001-90"),
            Some("clinica-norte")
        );
        assert_eq!(registry.resolve("98.765.432/0001-10"), Some("clinica-sul"));
        assert_eq!(registry.resolve("00000000000000"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_convert_normalizes_numbers_and_dates() {
        let rows = vec![
            row("12.345.678/0001-90", Some("1.234,56")),
            row("98765432000110", Some("1.234.567")),
        ];
        let outcome = convert_rows(&rows, &registry(), today());

        assert_eq!(outcome.imported(), 2);
        assert_eq!(outcome.skipped, 0);

        let operation = &outcome.operations[0];
        assert_eq!(operation.clinica_id, "clinica-norte");
        assert_eq!(operation.valor_liquido, Some(1234.56));
        assert_eq!(operation.valor_taxa, Some(150.0));
        assert_eq!(operation.data_antecipacao.as_deref(), Some("2025-01-10"));

        // A comma-less grouped net is a full amount, not a row to drop
        assert_eq!(outcome.operations[1].valor_liquido, Some(1234567.0));
    }

    #[test]
    fn test_unknown_cnpj_is_skipped_and_counted() {
        let rows = vec![
            row("12.345.678/0001-90", Some("100,00")),
            row("11.111.111/0001-11", Some("200,00")),
            row("98765432000110", Some("300,00")),
        ];
        let outcome = convert_rows(&rows, &registry(), today());

        assert_eq!(outcome.imported(), 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.operations[0].clinica_id, "clinica-norte");
        assert_eq!(outcome.operations[1].clinica_id, "clinica-sul");
    }

    #[test]
    fn test_missing_net_value_is_skipped() {
        let rows = vec![
            row("12.345.678/0001-90", None),
            row("12.345.678/0001-90", Some("not a number")),
            row("12.345.678/0001-90", Some("500,00")),
        ];
        let outcome = convert_rows(&rows, &registry(), today());

        assert_eq!(outcome.imported(), 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.operations[0].valor_liquido, Some(500.0));
    }

    #[test]
    fn test_missing_advance_date_falls_back_to_today() {
        let mut raw = row("12.345.678/0001-90", Some("100,00"));
        raw.data_antecipacao = None;

        let outcome = convert_rows(&[raw], &registry(), today());
        assert_eq!(
            outcome.operations[0].data_antecipacao.as_deref(),
            Some("2025-03-15")
        );
    }

    #[test]
    fn test_refund_date_lands_in_legacy_field_as_iso() {
        let mut raw = row("12.345.678/0001-90", Some("100,00"));
        raw.data_reembolso = Some("20/02/2025".to_string());

        let outcome = convert_rows(&[raw], &registry(), today());
        let operation = &outcome.operations[0];

        assert_eq!(operation.data_reembolso.as_deref(), Some("2025-02-20"));
        assert_eq!(operation.data_reembolso_programada, None);
        assert_eq!(operation.data_pagamento_reembolso, None);
    }

    #[test]
    fn test_empty_input_converts_to_nothing() {
        let outcome = convert_rows(&[], &registry(), today());
        assert_eq!(outcome.imported(), 0);
        assert_eq!(outcome.skipped, 0);
    }
}
