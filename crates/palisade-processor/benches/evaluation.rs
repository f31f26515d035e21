//! Evaluation hot-path benchmarks.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{any_value::Value, AnyValue, KeyValue};
use opentelemetry_proto::tonic::logs::v1::{LogRecord, ResourceLogs, ScopeLogs};

use palisade_policy::{compile, PolicyDef};
use palisade_processor::PolicyProcessor;

fn policy_set(count: usize) -> Vec<PolicyDef> {
    let mut json = Vec::with_capacity(count);
    for i in 0..count {
        json.push(format!(
            r#"{{"id": "policy-{i:04}", "name": "policy {i}",
                 "log": {{"match": [{{"field": {{"scope": "record", "path": ["component"]}}, "exact": "component-{i}"}}],
                          "keep": "none"}}}}"#,
        ));
    }
    serde_json::from_str(&format!("[{}]", json.join(","))).unwrap()
}

fn batch(records: usize) -> ExportLogsServiceRequest {
    let log_records = (0..records)
        .map(|i| LogRecord {
            body: Some(AnyValue {
                value: Some(Value::StringValue(format!("request {i} handled"))),
            }),
            severity_text: "INFO".to_owned(),
            attributes: vec![KeyValue {
                key: "component".to_owned(),
                value: Some(AnyValue {
                    value: Some(Value::StringValue(format!("component-{}", i % 7))),
                }),
            }],
            ..Default::default()
        })
        .collect();

    ExportLogsServiceRequest {
        resource_logs: vec![ResourceLogs {
            resource: None,
            scope_logs: vec![ScopeLogs {
                scope: None,
                log_records,
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        }],
    }
}

fn bench_process_logs(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_logs");
    let input = batch(512);

    for policies in [1usize, 16, 64] {
        let processor =
            PolicyProcessor::with_snapshot(Arc::new(compile(&policy_set(policies)).unwrap()));
        group.bench_with_input(
            BenchmarkId::from_parameter(policies),
            &policies,
            |b, _| {
                b.iter_batched(
                    || input.clone(),
                    |mut request| processor.process_logs(&mut request),
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_process_logs);
criterion_main!(benches);
