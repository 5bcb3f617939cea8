//! Data models for the cohort reports.
//!
//! This module contains the report kinds, the fixed category sets and
//! the envelope shape returned to the dashboard.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stage report bucket for stage 1 patients.
pub const CKD_1: &str = "CKD 1";
/// Stage report bucket for stage 2 through 5 patients.
pub const CKD_2: &str = "CKD 2";

/// Stage report categories, in emission order.
pub const STAGE_CATEGORIES: [&str; 2] = [CKD_1, CKD_2];

pub const TYPE_2_DIABETES: &str = "Type 2 Diabetes";
pub const HYPERTENSION: &str = "Hypertension";
pub const HYPERLIPIDEMIA: &str = "Hyperlipidemia";
pub const CHRONIC_KIDNEY_DISEASE: &str = "Chronic Kidney Disease";
pub const ANGINA_PECTORIS: &str = "Angina pectoris";
pub const MYOCARDIAL_INFARCTION: &str = "Myocardial Infarction";
pub const HEART_FAILURE: &str = "Heart Failure";
pub const STROKE: &str = "Stroke";

/// Comorbidity report categories, in declaration order.
///
/// Ties in the sorted comorbidity envelope fall back to this order.
pub const COMORBIDITY_CATEGORIES: [&str; 8] = [
    TYPE_2_DIABETES,
    HYPERTENSION,
    HYPERLIPIDEMIA,
    CHRONIC_KIDNEY_DISEASE,
    ANGINA_PECTORIS,
    MYOCARDIAL_INFARCTION,
    HEART_FAILURE,
    STROKE,
];

/// Which of the two dashboard reports to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// CKD staging (`data1`).
    Stage,
    /// Comorbidity prevalence (`data2`).
    Comorbidity,
}

impl ReportKind {
    /// Every report, in endpoint order.
    pub const ALL: [ReportKind; 2] = [ReportKind::Stage, ReportKind::Comorbidity];

    /// The endpoint name the dashboard requests this report by.
    pub fn envelope_name(&self) -> &'static str {
        match self {
            ReportKind::Stage => "data1",
            ReportKind::Comorbidity => "data2",
        }
    }

    /// The fixed categories of this report, in declaration order.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            ReportKind::Stage => &STAGE_CATEGORIES,
            ReportKind::Comorbidity => &COMORBIDITY_CATEGORIES,
        }
    }

    /// A human-readable title for rendered reports.
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Stage => "CKD Stage Distribution",
            ReportKind::Comorbidity => "Comorbidity Prevalence",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Stage => write!(f, "stage"),
            ReportKind::Comorbidity => write!(f, "comorbidity"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stage" | "data1" => Ok(ReportKind::Stage),
            "comorbidity" | "data2" => Ok(ReportKind::Comorbidity),
            other => Err(format!("Unknown report: {}", other)),
        }
    }
}

/// One category and its patient count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Patient counts for a fixed set of categories.
///
/// `counts` always holds exactly the categories of `kind`, in declaration
/// order. Presentation order is decided later when the envelope is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionReport {
    pub kind: ReportKind,
    pub counts: Vec<CategoryCount>,
    pub total_patients: usize,
}

impl ConditionReport {
    /// All categories at zero with no patients; the degraded result.
    pub fn zeroed(kind: ReportKind) -> Self {
        Self {
            kind,
            counts: kind
                .categories()
                .iter()
                .map(|label| CategoryCount {
                    label: (*label).to_string(),
                    count: 0,
                })
                .collect(),
            total_patients: 0,
        }
    }

    /// Set the count of a category. Labels outside the fixed set are ignored.
    pub fn set(&mut self, label: &str, count: usize) {
        if let Some(entry) = self.counts.iter_mut().find(|c| c.label == label) {
            entry.count = count;
        }
    }

    /// The count of a category, if it belongs to this report.
    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.count)
    }

    /// Whether every category is zero and there are no patients.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.total_patients == 0 && self.counts.iter().all(|c| c.count == 0)
    }
}

/// The categories/data/total_patients triple sent to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    /// Category labels, in presentation order.
    pub categories: Vec<String>,
    /// Counts parallel to `categories`.
    pub data: Vec<usize>,
    /// Patients the report was computed over.
    pub total_patients: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_from_str() {
        assert_eq!("stage".parse::<ReportKind>(), Ok(ReportKind::Stage));
        assert_eq!("DATA1".parse::<ReportKind>(), Ok(ReportKind::Stage));
        assert_eq!(
            "comorbidity".parse::<ReportKind>(),
            Ok(ReportKind::Comorbidity)
        );
        assert_eq!("data2".parse::<ReportKind>(), Ok(ReportKind::Comorbidity));
        assert!("data3".parse::<ReportKind>().is_err());
    }

    #[test]
    fn test_envelope_names() {
        assert_eq!(ReportKind::Stage.envelope_name(), "data1");
        assert_eq!(ReportKind::Comorbidity.envelope_name(), "data2");
    }

    #[test]
    fn test_zeroed_report_has_fixed_categories() {
        let report = ConditionReport::zeroed(ReportKind::Comorbidity);
        let labels: Vec<&str> = report.counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, COMORBIDITY_CATEGORIES.to_vec());
        assert!(report.is_empty());

        let stage = ConditionReport::zeroed(ReportKind::Stage);
        assert_eq!(stage.counts.len(), 2);
        assert_eq!(stage.get(CKD_1), Some(0));
    }

    #[test]
    fn test_set_ignores_unknown_label() {
        let mut report = ConditionReport::zeroed(ReportKind::Stage);
        report.set(CKD_2, 7);
        report.set("CKD 9", 3);

        assert_eq!(report.get(CKD_2), Some(7));
        assert_eq!(report.get("CKD 9"), None);
        assert_eq!(report.counts.len(), 2);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_envelope_serializes_field_names() {
        let envelope = ReportEnvelope {
            categories: vec![CKD_1.to_string(), CKD_2.to_string()],
            data: vec![1, 2],
            total_patients: 4,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(
            json,
            r#"{"categories":["CKD 1","CKD 2"],"data":[1,2],"total_patients":4}"#
        );
    }
}
