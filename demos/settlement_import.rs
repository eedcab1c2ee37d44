use chrono::NaiveDate;
use receivables_aging_engine::{classify_batch, convert_rows, ClinicRegistry, RawOperationRow};

fn main() {
    let mut registry = ClinicRegistry::new();
    registry.register("12.345.678/0001-90", "vila-mariana");
    registry.register("98765432000110", "pinheiros");

    let rows = vec![
        RawOperationRow {
            cnpj: "12.345.678/0001-90".to_string(),
            data_antecipacao: Some("10/01/2025".to_string()),
            data_reembolso: None,
            valor_liquido: Some("R$ 1.250,00".to_string()),
            valor_taxa: Some("43,75".to_string()),
            valor_a_pagar: Some("1.293,75".to_string()),
        },
        RawOperationRow {
            cnpj: "98.765.432/0001-10".to_string(),
            data_antecipacao: Some("2025-01-20".to_string()),
            data_reembolso: Some("28/02/2025".to_string()),
            valor_liquido: Some("3.400,00".to_string()),
            valor_taxa: Some("119,00".to_string()),
            valor_a_pagar: None,
        },
        // Unknown CNPJ, dropped during conversion.
        RawOperationRow {
            cnpj: "11.111.111/0001-11".to_string(),
            data_antecipacao: Some("15/01/2025".to_string()),
            data_reembolso: None,
            valor_liquido: Some("500,00".to_string()),
            valor_taxa: None,
            valor_a_pagar: None,
        },
        // Net value does not parse, dropped as well.
        RawOperationRow {
            cnpj: "12.345.678/0001-90".to_string(),
            data_antecipacao: Some("18/01/2025".to_string()),
            data_reembolso: None,
            valor_liquido: Some("a combinar".to_string()),
            valor_taxa: None,
            valor_a_pagar: None,
        },
    ];

    let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
    let outcome = convert_rows(&rows, &registry, today);

    println!(
        "Imported {} of {} rows ({} skipped)",
        outcome.imported(),
        rows.len(),
        outcome.skipped
    );

    for operation in &outcome.operations {
        println!(
            " - {}: net {:.2}, advanced {}, refunded {}",
            operation.clinica_id,
            operation.net_value(),
            operation.data_antecipacao.as_deref().unwrap_or("?"),
            operation.data_reembolso.as_deref().unwrap_or("-")
        );
    }

    // Settlement exports carry no scheduled refund date, so everything lands
    // in the no-due-date status until the schedule is filled in.
    let enriched = classify_batch(&outcome.operations, today);
    for row in &enriched {
        println!(
            " - {} classified as {}",
            row.clinica_id(),
            row.status.label()
        );
    }
}
