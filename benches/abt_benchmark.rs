//! Benchmarks for the window-aggregation engine

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use safra::pipeline::{
    build_abt, quantity_features, value_features, AbtConfig, CustomerRecord, DelinquencyRow,
    HistoryIndex, Transaction,
};

const CUSTOMERS: usize = 300;
const SAFRAS: [(&str, i32, u32); 6] = [
    ("2023-11", 2023, 11),
    ("2023-12", 2023, 12),
    ("2024-01", 2024, 1),
    ("2024-02", 2024, 2),
    ("2024-03", 2024, 3),
    ("2024-04", 2024, 4),
];

fn last_day(year: i32, month: u32) -> NaiveDate {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.unwrap().pred_opt().unwrap()
}

fn synthetic() -> (Vec<CustomerRecord>, Vec<DelinquencyRow>, Vec<Transaction>) {
    let mut customers = Vec::with_capacity(CUSTOMERS);
    let mut delinquency = Vec::new();
    let mut transactions = Vec::new();

    for c in 0..CUSTOMERS {
        let id = format!("C{:05}", c);
        customers.push(CustomerRecord {
            id_cliente: id.clone(),
            idade: Some(20.0 + (c % 50) as f64),
            renda_mensal: Some(1500.0 + (c % 40) as f64 * 100.0),
            data_abertura_conta: NaiveDate::from_ymd_opt(2015 + (c % 8) as i32, 1, 15),
            mes_abertura_conta: Some(format!("{}-01", 2015 + (c % 8))),
            estado_civil: Some("casado".to_string()),
            tempo_emprego_anos: Some((c % 20) as f64),
            qtde_produtos: Some((1 + c % 4) as f64),
            score_interno: Some(400.0 + (c % 300) as f64),
            limite_credito: Some(3000.0 + (c % 10) as f64 * 500.0),
        });

        for (label, year, month) in SAFRAS {
            delinquency.push(DelinquencyRow {
                id_cliente: id.clone(),
                mes_safra: label.to_string(),
                data_referencia: last_day(year, month),
                atraso_90d: Some(i32::from(c % 11 == 0)),
            });
        }

        // Roughly 40 transactions per customer spread over two years
        for t in 0..40usize {
            let month_offset = (c + t * 3) % 24;
            let year = 2022 + (5 + month_offset) as i32 / 12;
            let month = 1 + ((5 + month_offset) % 12) as u32;
            let day = 1 + ((c + t * 7) % 28) as u32;
            transactions.push(Transaction {
                id_cliente: id.clone(),
                data_transacao: NaiveDate::from_ymd_opt(year, month, day),
                mes_safra: Some(format!("{:04}-{:02}", year, month)),
                valor_transacao: Some(10.0 + ((c * t) % 500) as f64),
            });
        }
    }

    transactions.sort_by(|a, b| {
        a.id_cliente
            .cmp(&b.id_cliente)
            .then(a.data_transacao.cmp(&b.data_transacao))
    });
    (customers, delinquency, transactions)
}

fn bench_window_families(c: &mut Criterion) {
    let (_, delinquency, transactions) = synthetic();
    let index = HistoryIndex::build(&transactions);

    c.bench_function("value_features", |b| {
        b.iter(|| value_features(black_box(&delinquency), black_box(&index), true).unwrap())
    });
    c.bench_function("quantity_features", |b| {
        b.iter(|| quantity_features(black_box(&delinquency), black_box(&index), true).unwrap())
    });
}

fn bench_full_build(c: &mut Criterion) {
    let (customers, delinquency, transactions) = synthetic();
    let index = HistoryIndex::build(&transactions);
    let config = AbtConfig::default();

    c.bench_function("build_abt", |b| {
        b.iter(|| {
            build_abt(
                black_box(&customers),
                black_box(&delinquency),
                black_box(&index),
                &config,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_window_families, bench_full_build);
criterion_main!(benches);
