//! Metrics definitions for flag synchronization.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Histogram => "Histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        metrics::counter!($def.name)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        metrics::histogram!($def.name)
    };
}

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "flags.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Time to complete a request to the remote flag endpoint in seconds",
};

pub const FETCH_DEGRADED: MetricDef = MetricDef {
    name: "flags.fetch.degraded",
    metric_type: MetricType::Counter,
    description: "Number of remote fetches that degraded to an empty result",
};

pub const PARSE_SKIPPED: MetricDef = MetricDef {
    name: "flags.parse.skipped",
    metric_type: MetricType::Counter,
    description: "Number of recognized flag keys skipped because their value was malformed",
};

pub const REFRESH_COALESCED: MetricDef = MetricDef {
    name: "flags.refresh.coalesced",
    metric_type: MetricType::Counter,
    description: "Number of refresh calls that attached to an in-flight refresh",
};

pub const REFRESH_UPDATED: MetricDef = MetricDef {
    name: "flags.refresh.updated",
    metric_type: MetricType::Counter,
    description: "Number of refreshes that changed the synchronized flag set",
};

// All metrics must be listed here so they can be described at startup.
pub const ALL_METRICS: &[MetricDef] = &[
    FETCH_DURATION,
    FETCH_DEGRADED,
    PARSE_SKIPPED,
    REFRESH_COALESCED,
    REFRESH_UPDATED,
];
