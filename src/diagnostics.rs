//! Failure diagnostics captured at teardown
//!
//! When a test fails, the harness gathers container logs and namespace
//! events before anything is torn down, and renders them as one readable
//! report so the failure is debuggable from test output alone.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::Event;

const LINE_WIDTH: usize = 80;
const HEAVY_LINE: &str = "━";
const LIGHT_LINE: &str = "─";

/// Diagnostic state collected from a failed test's namespace.
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// The test namespace the diagnostics were gathered from.
    pub namespace: String,
    /// `pod/container` -> captured log tail. BTreeMap keeps report
    /// output deterministic.
    pub pod_logs: BTreeMap<String, String>,
    /// Events observed in the namespace.
    pub events: Vec<Event>,
}

impl Diagnostics {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Record the log tail for one container.
    pub fn add_container_logs(&mut self, pod: &str, container: &str, logs: String) {
        self.pod_logs.insert(format!("{pod}/{container}"), logs);
    }

    fn heavy_line() -> String {
        HEAVY_LINE.repeat(LINE_WIDTH)
    }

    fn section_header(title: &str) -> String {
        let titled = format!(" {title} ");
        let remaining = LINE_WIDTH.saturating_sub(titled.len() + 3);
        format!("{}{titled}{}", LIGHT_LINE.repeat(3), LIGHT_LINE.repeat(remaining))
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", Self::heavy_line())?;
        writeln!(f, "  KUBETEST FAILURE REPORT")?;
        writeln!(f, "{}", Self::heavy_line())?;
        writeln!(f)?;
        writeln!(f, "  Namespace: {}", self.namespace)?;

        if !self.pod_logs.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", Self::section_header("Container Logs"))?;

            for (source, logs) in &self.pod_logs {
                writeln!(f)?;
                writeln!(f, "[{source}]")?;
                if logs.is_empty() {
                    writeln!(f, "  (no logs)")?;
                } else {
                    for line in logs.lines() {
                        writeln!(f, "  {line}")?;
                    }
                }
            }
        }

        if !self.events.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{}",
                Self::section_header(&format!("Events ({})", self.events.len()))
            )?;
            writeln!(f)?;

            // Oldest first; events without a timestamp sort last.
            let mut events: Vec<_> = self.events.iter().collect();
            events.sort_by_key(|event| {
                event
                    .last_timestamp
                    .as_ref()
                    .map(|t| t.0)
                    .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
            });

            for event in events {
                let timestamp = event
                    .last_timestamp
                    .as_ref()
                    .map(|t| t.0.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "??:??:??".to_string());
                let kind = event.involved_object.kind.as_deref().unwrap_or("?");
                let name = event.involved_object.name.as_deref().unwrap_or("?");
                let reason = event.reason.as_deref().unwrap_or("Unknown");
                let message = event.message.as_deref().unwrap_or("");

                writeln!(
                    f,
                    "  • {timestamp}  {:16}  {reason:12}  {message}",
                    format!("{kind}/{name}"),
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", Self::section_header("Debug"))?;
        writeln!(f)?;
        writeln!(f, "  kubectl -n {} get all", self.namespace)?;
        writeln!(f, "  kubectl -n {} describe pods", self.namespace)?;
        writeln!(f, "  kubectl -n {} get events", self.namespace)?;
        writeln!(f)?;
        writeln!(f, "{}", Self::heavy_line())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ObjectReference;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use k8s_openapi::chrono::{TimeZone, Utc};

    #[test]
    fn test_report_names_namespace() {
        let diag = Diagnostics::new("kubetest-example-2026");
        let output = diag.to_string();
        assert!(output.contains("Namespace: kubetest-example-2026"));
        assert!(output.contains("kubectl -n kubetest-example-2026 get all"));
        assert!(output.contains("KUBETEST FAILURE REPORT"));
    }

    #[test]
    fn test_report_includes_container_logs() {
        let mut diag = Diagnostics::new("kubetest-example");
        diag.add_container_logs("web-0", "app", "connection refused".to_string());
        diag.add_container_logs("web-0", "sidecar", String::new());

        let output = diag.to_string();
        assert!(output.contains("[web-0/app]"));
        assert!(output.contains("  connection refused"));
        assert!(output.contains("[web-0/sidecar]"));
        assert!(output.contains("(no logs)"));
    }

    #[test]
    fn test_report_formats_events() {
        let mut diag = Diagnostics::new("kubetest-example");
        diag.events.push(Event {
            reason: Some("BackOff".to_string()),
            message: Some("Back-off pulling image".to_string()),
            involved_object: ObjectReference {
                kind: Some("Pod".to_string()),
                name: Some("web-0".to_string()),
                ..Default::default()
            },
            last_timestamp: Some(Time(Utc.with_ymd_and_hms(2026, 8, 30, 10, 42, 1).unwrap())),
            ..Default::default()
        });

        let output = diag.to_string();
        assert!(output.contains("Events (1)"));
        assert!(output.contains("Pod/web-0"));
        assert!(output.contains("BackOff"));
        assert!(output.contains("10:42:01"));
    }

    #[test]
    fn test_events_sorted_oldest_first() {
        let mut diag = Diagnostics::new("kubetest-example");
        for (hour, reason) in [(12, "Later"), (9, "Earlier")] {
            diag.events.push(Event {
                reason: Some(reason.to_string()),
                last_timestamp: Some(Time(
                    Utc.with_ymd_and_hms(2026, 8, 30, hour, 0, 0).unwrap(),
                )),
                ..Default::default()
            });
        }

        let output = diag.to_string();
        let earlier = output.find("Earlier").unwrap();
        let later = output.find("Later").unwrap();
        assert!(earlier < later);
    }
}
