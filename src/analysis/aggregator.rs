//! Patient-count aggregation.
//!
//! This module computes the stage and comorbidity reports from a loaded
//! dataset, and applies the degrade-to-zero policy when the dataset
//! cannot be loaded.

use crate::dataset::{
    Column, Dataset, DatasetLoader, LoadFailure, ANGINA, CKD_STAGE, HF, HLD, HTN, MI, STROKE,
};
use crate::models::{
    ConditionReport, ReportKind, ANGINA_PECTORIS, CHRONIC_KIDNEY_DISEASE, CKD_1, CKD_2,
    HEART_FAILURE, HYPERLIPIDEMIA, HYPERTENSION, MYOCARDIAL_INFARCTION, STROKE as STROKE_LABEL,
};
use tracing::{debug, error, info, warn};

/// Stage values counted as "CKD 1".
const STAGE_1: [&str; 1] = ["1"];

/// Stage values counted as "CKD 2" in the stage report.
const STAGE_2_TO_5: [&str; 4] = ["2", "3", "4", "5"];

/// Stage values counted as chronic kidney disease in the comorbidity report.
const STAGE_3_TO_5: [&str; 3] = ["3", "4", "5"];

/// Value of a positive boolean indicator.
const INDICATOR_TRUE: [&str; 1] = ["1"];

/// Indicator columns and the comorbidity each one reports.
///
/// Nothing feeds "Type 2 Diabetes"; it stays at zero.
const INDICATOR_COLUMNS: [(&str, &str); 6] = [
    (HTN, HYPERTENSION),
    (HLD, HYPERLIPIDEMIA),
    (ANGINA, ANGINA_PECTORIS),
    (MI, MYOCARDIAL_INFARCTION),
    (HF, HEART_FAILURE),
    (STROKE, STROKE_LABEL),
];

/// Count present cells whose trimmed value is one of `accepted`.
fn count_present(column: &Column, accepted: &[&str]) -> usize {
    column
        .present_values()
        .filter(|v| accepted.contains(v))
        .count()
}

/// Compute the CKD stage report.
///
/// `total_patients` counts records with any non-null stage, so values
/// outside 1..5 add to the total without landing in a bucket. Without a
/// `ckd_stage` column the report is all zeros.
pub fn stage_report(dataset: &Dataset) -> ConditionReport {
    let mut report = ConditionReport::zeroed(ReportKind::Stage);

    let Some(stage) = dataset.column(CKD_STAGE) else {
        warn!("Column '{}' missing; stage report is empty", CKD_STAGE);
        return report;
    };

    report.set(CKD_1, count_present(stage, &STAGE_1));
    report.set(CKD_2, count_present(stage, &STAGE_2_TO_5));
    report.total_patients = stage.non_null_count();

    report
}

/// Compute the comorbidity report.
///
/// Each indicator counts cells equal to `"1"` once nulls become `"0"`.
/// Chronic kidney disease counts stages 3 to 5. `total_patients` is the
/// number of records whatever columns are present.
pub fn comorbidity_report(dataset: &Dataset) -> ConditionReport {
    let mut report = ConditionReport::zeroed(ReportKind::Comorbidity);
    report.total_patients = dataset.row_count();

    for (column_name, label) in INDICATOR_COLUMNS {
        match dataset.column(column_name) {
            Some(column) => report.set(label, column.count_matching(&INDICATOR_TRUE)),
            None => debug!("Column '{}' missing; {} left at 0", column_name, label),
        }
    }

    match dataset.column(CKD_STAGE) {
        Some(stage) => report.set(CHRONIC_KIDNEY_DISEASE, stage.count_matching(&STAGE_3_TO_5)),
        None => debug!(
            "Column '{}' missing; {} left at 0",
            CKD_STAGE, CHRONIC_KIDNEY_DISEASE
        ),
    }

    report
}

/// Compute one report over a loaded dataset.
pub fn compute(kind: ReportKind, dataset: &Dataset) -> ConditionReport {
    match kind {
        ReportKind::Stage => stage_report(dataset),
        ReportKind::Comorbidity => comorbidity_report(dataset),
    }
}

/// Loads the cohort and computes reports, one fresh load per report.
///
/// Nothing is cached between calls, so an `Aggregator` can be shared
/// across concurrent requests.
#[derive(Debug, Clone)]
pub struct Aggregator {
    loader: DatasetLoader,
}

impl Aggregator {
    pub fn new(loader: DatasetLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &DatasetLoader {
        &self.loader
    }

    /// Load the dataset and compute `kind`, surfacing load failures.
    pub fn try_report(&self, kind: ReportKind) -> Result<ConditionReport, LoadFailure> {
        let dataset = self.loader.load()?;
        let report = compute(kind, &dataset);

        info!(
            "Computed {} report: {} patients",
            kind, report.total_patients
        );
        for entry in &report.counts {
            debug!("  {}: {}", entry.label, entry.count);
        }

        Ok(report)
    }

    /// Load the dataset and compute `kind`.
    ///
    /// A missing or unreadable file yields the zeroed report; the failure
    /// is only logged.
    pub fn report(&self, kind: ReportKind) -> ConditionReport {
        match self.try_report(kind) {
            Ok(report) => report,
            Err(failure) => {
                match &failure {
                    LoadFailure::SourceNotFound { .. } => error!("Error: {}", failure),
                    LoadFailure::LoadError { .. } => error!("Error loading CSV: {}", failure),
                }
                ConditionReport::zeroed(kind)
            }
        }
    }

    /// The CKD stage report (`data1`).
    #[allow(dead_code)] // Endpoint-named entry point
    pub fn stage_report(&self) -> ConditionReport {
        self.report(ReportKind::Stage)
    }

    /// The comorbidity report (`data2`).
    #[allow(dead_code)] // Endpoint-named entry point
    pub fn comorbidity_report(&self) -> ConditionReport {
        self.report(ReportKind::Comorbidity)
    }
}
