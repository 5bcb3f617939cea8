//! Envelope shaping and report rendering.
//!
//! This module turns computed reports into the envelopes the dashboard
//! reads, and renders them as JSON or Markdown.

use crate::models::{ConditionReport, ReportEnvelope, ReportKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;

/// Shape a report into its envelope.
///
/// The stage report keeps its declared order. The comorbidity report is
/// sorted by descending count, ties keeping declaration order.
pub fn build_envelope(report: &ConditionReport) -> ReportEnvelope {
    let mut counts = report.counts.clone();

    if report.kind == ReportKind::Comorbidity {
        // sort_by_key is stable
        counts.sort_by_key(|c| std::cmp::Reverse(c.count));
    }

    ReportEnvelope {
        categories: counts.iter().map(|c| c.label.clone()).collect(),
        data: counts.iter().map(|c| c.count).collect(),
        total_patients: report.total_patients,
    }
}

/// Render envelopes as JSON.
///
/// A single envelope is emitted on its own; several are keyed by their
/// endpoint name.
pub fn generate_json_report(
    envelopes: &[(ReportKind, ReportEnvelope)],
    pretty: bool,
) -> Result<String> {
    let value = match envelopes {
        [(_, envelope)] => serde_json::to_value(envelope)?,
        _ => {
            let mut map = Map::new();
            for (kind, envelope) in envelopes {
                map.insert(
                    kind.envelope_name().to_string(),
                    serde_json::to_value(envelope)?,
                );
            }
            Value::Object(map)
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };

    Ok(json)
}

/// Render envelopes as a Markdown summary.
pub fn generate_markdown_report(
    envelopes: &[(ReportKind, ReportEnvelope)],
    source: &Path,
    generated_at: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    output.push_str("# Cohort Report\n\n");
    output.push_str(&format!("- **Source:** `{}`\n", source.display()));
    output.push_str(&format!(
        "- **Generated:** {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for (kind, envelope) in envelopes {
        output.push_str(&generate_envelope_section(*kind, envelope));
    }

    output
}

/// Generate the table for one envelope.
fn generate_envelope_section(kind: ReportKind, envelope: &ReportEnvelope) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {} (`{}`)\n\n", kind.title(), kind.envelope_name()));
    section.push_str("| Category | Patients | Share |\n");
    section.push_str("|:---|---:|---:|\n");

    for (label, count) in envelope.categories.iter().zip(&envelope.data) {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            label,
            count,
            share(*count, envelope.total_patients)
        ));
    }

    section.push_str(&format!(
        "\n**Total patients:** {}\n\n",
        envelope.total_patients
    ));

    section
}

fn share(count: usize, total: usize) -> String {
    if total == 0 {
        "-".to_string()
    } else {
        format!("{:.1}%", count as f64 * 100.0 / total as f64)
    }
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(())
}
