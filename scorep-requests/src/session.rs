//! Server-side session state: the currently open report plus any metrics
//! installed by `DefineMetric` (spec.md §4.8). Concurrency is the
//! connection layer's concern (§4.9/§5: "report model is read-only to
//! queries; DefineMetric mutates under a single-writer lock") — this type
//! is the plain value wrapped by that lock, not the lock itself.
use scorep_report::{Metric, MetricId, Profile};

#[derive(Default)]
pub struct CubeSession {
    report: Option<Profile>,
    report_path: Option<String>,
    installed_metrics: Vec<Metric>,
}

impl CubeSession {
    pub fn new() -> CubeSession {
        CubeSession::default()
    }

    pub fn report(&self) -> Option<&Profile> {
        self.report.as_ref()
    }

    pub fn report_path(&self) -> Option<&str> {
        self.report_path.as_deref()
    }

    pub fn open(&mut self, path: String, profile: Profile) {
        self.report = Some(profile);
        self.report_path = Some(path);
        self.installed_metrics.clear();
    }

    pub fn close(&mut self) {
        self.report = None;
        self.report_path = None;
        self.installed_metrics.clear();
    }

    /// Installs a derived metric, returning the id it was assigned. The id
    /// space continues past the report's own metrics, since the report
    /// model itself is immutable once built (spec.md §4.2).
    pub fn install_metric(&mut self, metric: Metric) -> MetricId {
        let base = self.report.as_ref().map(|r| r.number_of_metrics()).unwrap_or(0);
        let id = MetricId((base + self.installed_metrics.len()) as u32);
        self.installed_metrics.push(metric);
        id
    }

    pub fn installed_metrics(&self) -> &[Metric] {
        &self.installed_metrics
    }
}
