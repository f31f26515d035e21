//! In-place batch traversal.
//!
//! The processor walks each batch's resource → scope → record tree, invokes
//! the policy engine once per record, removes dropped records, and prunes
//! scopes and resources left empty. Surviving entries keep their relative
//! order; the walk is a single retain-in-place sweep per list.
//!
//! The active snapshot lives in one atomic pointer, loaded once at the start
//! of a batch so the whole batch observes a consistent policy set even if
//! policies are replaced mid-flight. Entry points are synchronous and may be
//! called from multiple threads; each batch is mutated only by its caller's
//! thread.

use std::sync::Arc;

use arc_swap::ArcSwap;
use metrics::counter;
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::tonic::common::v1::{InstrumentationScope, KeyValue};
use opentelemetry_proto::tonic::metrics::v1::{metric, AggregationTemporality, Metric};
use opentelemetry_proto::tonic::resource::v1::Resource;
use palisade_policy::{
    evaluate, CompiledPolicy, Disposition, Evaluation, MetricField, MetricKeep, PolicyRegistry,
    PolicySnapshot,
};

use crate::context::{LogCtx, MetricCtx, MetricType, TraceCtx};
use crate::sampling::{merge_ot_tracestate, threshold_hex};

/// Counter name for per-record evaluation outcomes.
const RECORDS_COUNTER: &str = "processor_policy_records";

/// The inline policy processor: holds the active snapshot and applies it to
/// batches in place. Callers must advertise that they mutate data.
pub struct PolicyProcessor {
    snapshot: ArcSwap<PolicySnapshot>,
}

impl Default for PolicyProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyProcessor {
    /// Create a processor with an empty snapshot; every batch passes through
    /// unchanged until one is installed.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(PolicySnapshot::default()),
        }
    }

    pub fn with_snapshot(snapshot: Arc<PolicySnapshot>) -> Self {
        Self {
            snapshot: ArcSwap::new(snapshot),
        }
    }

    /// Atomically replace the active snapshot.
    pub fn install(&self, snapshot: Arc<PolicySnapshot>) {
        self.snapshot.store(snapshot);
    }

    /// The currently active snapshot.
    pub fn current(&self) -> Arc<PolicySnapshot> {
        self.snapshot.load_full()
    }

    /// Mirror a registry's snapshot into this processor, now and on every
    /// recompile.
    pub fn attach(self: Arc<Self>, registry: &PolicyRegistry) {
        self.install(registry.snapshot());
        registry.set_on_recompile(Box::new(move |snapshot| {
            self.install(Arc::clone(snapshot));
        }));
    }

    /// Evaluate every log record in the batch, removing dropped records and
    /// pruning emptied scopes and resources.
    pub fn process_logs(&self, request: &mut ExportLogsServiceRequest) {
        let snapshot = self.snapshot.load();
        if snapshot.logs.is_empty() {
            return;
        }

        request.resource_logs.retain_mut(|resource_logs| {
            let resource = &mut resource_logs.resource;
            let resource_schema_url = resource_logs.schema_url.as_str();

            resource_logs.scope_logs.retain_mut(|scope_logs| {
                let scope = &mut scope_logs.scope;
                let scope_schema_url = scope_logs.schema_url.as_str();

                scope_logs.log_records.retain_mut(|record| {
                    let mut ctx = LogCtx {
                        record,
                        resource: &mut *resource,
                        scope: &mut *scope,
                        resource_schema_url,
                        scope_schema_url,
                    };
                    let evaluation = evaluate(&snapshot.logs, &mut ctx);
                    observe("logs", &evaluation);
                    evaluation.disposition.retains()
                });
                !scope_logs.log_records.is_empty()
            });
            !resource_logs.scope_logs.is_empty()
        });
    }

    /// Evaluate every metric datapoint in the batch. A metric whose
    /// datapoints are all dropped is removed, cascading into scope and
    /// resource pruning.
    pub fn process_metrics(&self, request: &mut ExportMetricsServiceRequest) {
        let snapshot = self.snapshot.load();
        if snapshot.metrics.is_empty() {
            return;
        }

        request.resource_metrics.retain_mut(|resource_metrics| {
            let resource = &mut resource_metrics.resource;
            let resource_schema_url = resource_metrics.schema_url.as_str();

            resource_metrics.scope_metrics.retain_mut(|scope_metrics| {
                let scope = &mut scope_metrics.scope;
                let scope_schema_url = scope_metrics.schema_url.as_str();

                scope_metrics.metrics.retain_mut(|m| {
                    process_metric(
                        m,
                        &mut *resource,
                        &mut *scope,
                        resource_schema_url,
                        scope_schema_url,
                        &snapshot.metrics,
                    )
                });
                !scope_metrics.metrics.is_empty()
            });
            !resource_metrics.scope_metrics.is_empty()
        });
    }

    /// Evaluate every span in the batch. Spans kept via sampling get the
    /// applied threshold merged into their tracestate.
    pub fn process_traces(&self, request: &mut ExportTraceServiceRequest) {
        let snapshot = self.snapshot.load();
        if snapshot.traces.is_empty() {
            return;
        }

        request.resource_spans.retain_mut(|resource_spans| {
            let resource = &mut resource_spans.resource;
            let resource_schema_url = resource_spans.schema_url.as_str();

            resource_spans.scope_spans.retain_mut(|scope_spans| {
                let scope = &mut scope_spans.scope;
                let scope_schema_url = scope_spans.schema_url.as_str();

                scope_spans.spans.retain_mut(|span| {
                    let mut ctx = TraceCtx {
                        span: &mut *span,
                        resource: &mut *resource,
                        scope: &mut *scope,
                        resource_schema_url,
                        scope_schema_url,
                    };
                    let evaluation = evaluate(&snapshot.traces, &mut ctx);
                    observe("traces", &evaluation);

                    if let Disposition::Sample(percentage) = evaluation.disposition {
                        let entry = format!("th:{}", threshold_hex(percentage));
                        span.trace_state = merge_ot_tracestate(&span.trace_state, &entry);
                    }
                    evaluation.disposition.retains()
                });
                !scope_spans.spans.is_empty()
            });
            !resource_spans.scope_spans.is_empty()
        });
    }
}

/// Evaluate one metric's datapoints; returns whether the metric survives.
fn process_metric(
    m: &mut Metric,
    resource: &mut Option<Resource>,
    scope: &mut Option<InstrumentationScope>,
    resource_schema_url: &str,
    scope_schema_url: &str,
    policies: &[CompiledPolicy<MetricField, MetricKeep>],
) -> bool {
    let name = &mut m.name;
    let description = &mut m.description;
    let unit = &mut m.unit;

    // A metric with no data carries no datapoints; nothing to evaluate.
    let Some(data) = m.data.as_mut() else {
        return true;
    };

    let mut shared = SharedMetric {
        name,
        description,
        unit,
        resource,
        scope,
        resource_schema_url,
        scope_schema_url,
    };

    match data {
        metric::Data::Gauge(gauge) => {
            retain_points(
                &mut gauge.data_points,
                |p| &mut p.attributes,
                MetricType::Gauge,
                AggregationTemporality::Unspecified,
                &mut shared,
                policies,
            );
            !gauge.data_points.is_empty()
        }
        metric::Data::Sum(sum) => {
            let temporality = sum.aggregation_temporality();
            retain_points(
                &mut sum.data_points,
                |p| &mut p.attributes,
                MetricType::Sum,
                temporality,
                &mut shared,
                policies,
            );
            !sum.data_points.is_empty()
        }
        metric::Data::Histogram(histogram) => {
            let temporality = histogram.aggregation_temporality();
            retain_points(
                &mut histogram.data_points,
                |p| &mut p.attributes,
                MetricType::Histogram,
                temporality,
                &mut shared,
                policies,
            );
            !histogram.data_points.is_empty()
        }
        metric::Data::ExponentialHistogram(histogram) => {
            let temporality = histogram.aggregation_temporality();
            retain_points(
                &mut histogram.data_points,
                |p| &mut p.attributes,
                MetricType::ExponentialHistogram,
                temporality,
                &mut shared,
                policies,
            );
            !histogram.data_points.is_empty()
        }
        metric::Data::Summary(summary) => {
            retain_points(
                &mut summary.data_points,
                |p| &mut p.attributes,
                MetricType::Summary,
                AggregationTemporality::Unspecified,
                &mut shared,
                policies,
            );
            !summary.data_points.is_empty()
        }
    }
}

/// Metric-level context shared by every datapoint of one metric.
struct SharedMetric<'a> {
    name: &'a mut String,
    description: &'a mut String,
    unit: &'a mut String,
    resource: &'a mut Option<Resource>,
    scope: &'a mut Option<InstrumentationScope>,
    resource_schema_url: &'a str,
    scope_schema_url: &'a str,
}

fn retain_points<P>(
    points: &mut Vec<P>,
    attributes_of: impl Fn(&mut P) -> &mut Vec<KeyValue>,
    metric_type: MetricType,
    temporality: AggregationTemporality,
    shared: &mut SharedMetric<'_>,
    policies: &[CompiledPolicy<MetricField, MetricKeep>],
) {
    points.retain_mut(|point| {
        let mut ctx = MetricCtx {
            name: &mut *shared.name,
            description: &mut *shared.description,
            unit: &mut *shared.unit,
            metric_type,
            temporality,
            attributes: attributes_of(point),
            resource: &mut *shared.resource,
            scope: &mut *shared.scope,
            resource_schema_url: shared.resource_schema_url,
            scope_schema_url: shared.scope_schema_url,
        };
        let evaluation = evaluate(policies, &mut ctx);
        observe("metrics", &evaluation);
        evaluation.disposition.retains()
    });
}

fn observe(telemetry_type: &'static str, evaluation: &Evaluation) {
    let result = match evaluation.disposition {
        Disposition::Drop => "dropped",
        Disposition::Keep => "kept",
        Disposition::Sample(_) => "sampled",
        Disposition::NoMatch => "no_match",
    };
    counter!(
        RECORDS_COUNTER,
        "telemetry_type" => telemetry_type,
        "result" => result,
    )
    .increment(1);
}
