//! Metric tree nodes, grounded on `cube::Metric`. CubePL expressions are
//! opaque strings here — spec.md §3 is explicit that they are "opaque to
//! the core"; no evaluator is in scope.
use scorep_value::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    PreDerived,
    PostDerived,
    Exclusive,
    Inclusive,
}

/// The four CubePL-style expressions a derived metric carries. Never
/// evaluated by this crate; stored so `DefineMetric` (4.8) can round-trip
/// them back to a report writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CubePlExpressions {
    pub init: String,
    pub plus: String,
    pub minus: String,
    pub aggregate: String,
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub display_name: String,
    pub data_type: ValueType,
    pub unit: String,
    pub value_kind: String,
    pub description: String,
    pub kind: MetricKind,
    pub expressions: CubePlExpressions,
    pub ghost: bool,
    pub visible: bool,
    pub parent: Option<MetricId>,
    pub children: Vec<MetricId>,
}
