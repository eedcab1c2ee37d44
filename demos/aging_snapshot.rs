use chrono::NaiveDate;
use receivables_aging_engine::{
    process_receivables, select, ClinicSummaryRow, Operation, OperationFilter, RiskBucket,
    SortKey, SortSpec,
};

fn operation(
    id: &str,
    clinica_id: &str,
    valor: f64,
    programada: Option<&str>,
    pagamento: Option<&str>,
) -> Operation {
    Operation {
        id: Some(id.to_string()),
        clinica_id: clinica_id.to_string(),
        cnpj: None,
        valor_liquido: Some(valor),
        valor_taxa: Some(valor * 0.035),
        valor_a_pagar: Some(valor * 1.035),
        data_antecipacao: Some("2025-01-10".to_string()),
        data_reembolso_programada: programada.map(str::to_string),
        data_pagamento_reembolso: pagamento.map(str::to_string),
        data_reembolso: None,
    }
}

fn main() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    let operations = vec![
        operation("op-01", "vila-mariana", 12_000.0, Some("2025-02-20"), None),
        operation("op-02", "vila-mariana", 8_000.0, Some("2025-03-21"), None),
        operation("op-03", "pinheiros", 20_000.0, Some("2024-12-01"), None),
        operation(
            "op-04",
            "pinheiros",
            5_000.0,
            Some("2025-02-01"),
            Some("2025-02-18"),
        ),
        operation("op-05", "moema", 9_500.0, Some("2025-04-10"), None),
        operation("op-06", "moema", 3_000.0, None, None),
    ];

    let clinics = vec![
        ClinicSummaryRow {
            clinica_id: "vila-mariana".to_string(),
            nome: Some("Clínica Vila Mariana".to_string()),
            cnpj: None,
            total_antecipado: Some(20_000.0),
            total_reembolsado: Some(0.0),
            em_aberto: Some(20_000.0),
            saldo_antecipavel: Some(40_000.0),
            limite_aprovado: Some(60_000.0),
        },
        ClinicSummaryRow {
            clinica_id: "pinheiros".to_string(),
            nome: Some("Clínica Pinheiros".to_string()),
            cnpj: None,
            total_antecipado: Some(25_000.0),
            total_reembolsado: Some(5_000.0),
            em_aberto: Some(20_000.0),
            saldo_antecipavel: Some(15_000.0),
            limite_aprovado: Some(50_000.0),
        },
        ClinicSummaryRow {
            clinica_id: "moema".to_string(),
            nome: Some("Clínica Moema".to_string()),
            cnpj: None,
            total_antecipado: Some(12_500.0),
            total_reembolsado: Some(0.0),
            em_aberto: Some(12_500.0),
            saldo_antecipavel: Some(30_000.0),
            limite_aprovado: None,
        },
    ];

    let snapshot = process_receivables(&operations, &clinics, today);

    println!(
        "Open total: {:.2} across {} operations",
        snapshot.stats.aberto_total, snapshot.stats.qtd_aberto
    );
    println!(
        "  overdue {:.2} | on time {:.2} | no due date {:.2}",
        snapshot.stats.aberto_vencido, snapshot.stats.aberto_em_dia, snapshot.stats.aberto_sem_venc
    );
    println!(
        "Delinquency ratio: {:.1}%",
        snapshot.stats.taxa_atraso * 100.0
    );
    println!(
        "Expected inflow: {:.2} inside 30 days, {:.2} inside 60",
        snapshot.stats.previsto_30, snapshot.stats.previsto_60
    );

    let overdue = &snapshot.stats.vencido_por_faixa;
    println!(
        "Overdue by age: <=7 {:.2} | <=15 {:.2} | <=30 {:.2} | <=60 {:.2} | >60 {:.2}",
        overdue.ate_7, overdue.ate_15, overdue.ate_30, overdue.ate_60, overdue.acima_60
    );

    println!("Delinquency ranking:");
    for entry in &snapshot.ranking {
        match entry.perc_atraso {
            Some(perc) => println!(
                " - {}: {:.2} late ({:.1}% of the clinic's volume)",
                entry.clinica_id,
                entry.valor_atraso,
                perc * 100.0
            ),
            None => println!(" - {}: {:.2} late", entry.clinica_id, entry.valor_atraso),
        }
    }

    println!("Summary strip:");
    for summary in &snapshot.summaries {
        println!(
            " - {}: em aberto {:.2}, em atraso {:.2}",
            summary.row.clinica_id,
            summary.row.em_aberto.unwrap_or(0.0),
            summary.valor_atraso
        );
    }
    println!(
        "Portfolio: {:.2} advanced, {:.2} refunded, {:.2} open",
        snapshot.portfolio.total_antecipado,
        snapshot.portfolio.total_reembolsado,
        snapshot.portfolio.em_aberto
    );

    // The sort request is ignored while a risk window is active, so these
    // rows come back in input order.
    let filter = OperationFilter {
        risk_buckets: vec![RiskBucket::Days0To7, RiskBucket::Days16To30],
        ..OperationFilter::default()
    };
    let sort = SortSpec::ascending(SortKey::ValorLiquido);
    let due_soon = select(&snapshot.operations, &filter, Some(&sort), today);

    println!("Open and due inside the selected windows:");
    for row in &due_soon {
        println!(
            " - {} ({}): {:.2} due {}",
            row.operation.id.as_deref().unwrap_or("?"),
            row.clinica_id(),
            row.net_value(),
            row.operation
                .data_reembolso_programada
                .as_deref()
                .unwrap_or("?")
        );
    }
}
