use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cyanea_ontology::{ExternalRecord, Ontology, OntologyTerm, Reconciler, ReconcileConfig};

fn make_ontology(n_terms: usize) -> Ontology {
    let terms = (0..n_terms)
        .map(|i| {
            OntologyTerm::canonical(format!("cell type {i}"), format!("CL:{i:07}"))
                .unwrap()
                .with_synonyms([format!("celltype-{i}")])
        })
        .collect();
    Ontology::new(terms).unwrap()
}

fn make_records(n_records: usize, n_terms: usize) -> Vec<ExternalRecord> {
    let mut state: u64 = 42;
    (0..n_records)
        .map(|i| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let t = (state >> 33) as usize % n_terms;
            let id = format!("CL:{t:07}");
            let record = match i % 3 {
                0 => ExternalRecord::new(format!("cell type {t}s"), Some(&id)),
                1 => ExternalRecord::new(format!("Cell Type {t}"), None),
                _ => ExternalRecord::new(format!("novel population {i}"), None),
            };
            record.unwrap()
        })
        .collect()
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let reconciler = Reconciler::new(ReconcileConfig::default()).unwrap();
    for &n_terms in &[500, 2000] {
        let ontology = make_ontology(n_terms);
        let records = make_records(100, n_terms);
        group.bench_with_input(BenchmarkId::new("terms", n_terms), &n_terms, |b, _| {
            b.iter(|| reconciler.reconcile(black_box(&records), &ontology).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
