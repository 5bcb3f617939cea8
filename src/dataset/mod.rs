//! In-memory tabular view of the cohort file.
//!
//! A [`Dataset`] is column-oriented: one [`Column`] per header name, each
//! holding one optional raw value per record. Datasets are built by the
//! [`DatasetLoader`] and live only for the duration of one report.

pub mod loader;

pub use loader::{DatasetLoader, LoadFailure, LoadOptions};

/// Stage column, string-typed categorical values `"1"`..`"5"`.
pub const CKD_STAGE: &str = "ckd_stage";
pub const HTN: &str = "htn";
pub const HLD: &str = "hld";
pub const ANGINA: &str = "angina";
pub const MI: &str = "mi";
pub const HF: &str = "hf";
pub const STROKE: &str = "stroke";

/// A column the reports read, and the value a null cell stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedColumn {
    pub name: &'static str,
    pub null_default: &'static str,
}

/// Every column the reports know about. All of them are optional.
pub const EXPECTED_COLUMNS: [ExpectedColumn; 7] = [
    ExpectedColumn { name: CKD_STAGE, null_default: "0" },
    ExpectedColumn { name: HTN, null_default: "0" },
    ExpectedColumn { name: HLD, null_default: "0" },
    ExpectedColumn { name: ANGINA, null_default: "0" },
    ExpectedColumn { name: MI, null_default: "0" },
    ExpectedColumn { name: HF, null_default: "0" },
    ExpectedColumn { name: STROKE, null_default: "0" },
];

/// Look up the declared null default of an expected column.
pub fn null_default(name: &str) -> Option<&'static str> {
    EXPECTED_COLUMNS
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.null_default)
}

/// A named column of raw cell values. `None` is a null cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    values: Vec<Option<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(dead_code)]
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Number of non-null cells.
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Trimmed values of the non-null cells, in record order.
    pub fn present_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().flatten().map(|v| v.trim())
    }

    /// Trimmed values of every cell, with nulls replaced by `default`.
    pub fn values_or<'a>(&'a self, default: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .map(move |v| v.as_deref().map(str::trim).unwrap_or(default))
    }

    /// Count cells whose normalized value is one of `accepted`.
    ///
    /// Nulls take the column's declared default before the comparison.
    pub fn count_matching(&self, accepted: &[&str]) -> usize {
        let default = null_default(&self.name).unwrap_or("");
        self.values_or(default)
            .filter(|v| accepted.contains(v))
            .count()
    }

    pub(crate) fn push(&mut self, value: Option<String>) {
        self.values.push(value);
    }
}

/// A loaded cohort table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    /// Build a dataset from columns of equal length.
    ///
    /// Columns shorter than the longest are padded with nulls. A repeated
    /// name keeps only its first column.
    #[cfg(test)]
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let mut kept: Vec<Column> = Vec::with_capacity(columns.len());

        for mut column in columns {
            if kept.iter().any(|c| c.name == column.name) {
                continue;
            }
            column.values.resize(row_count, None);
            kept.push(column);
        }

        Self {
            columns: kept,
            row_count,
        }
    }

    /// Total number of records.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Expected columns this dataset does not carry.
    pub fn missing_columns(&self) -> Vec<&'static str> {
        EXPECTED_COLUMNS
            .iter()
            .map(|c| c.name)
            .filter(|name| !self.has_column(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(String::from)).collect()
    }

    #[test]
    fn test_present_values_trims_and_skips_nulls() {
        let column = Column::new(CKD_STAGE, cells(&[Some(" 1 "), None, Some("3")]));
        let values: Vec<&str> = column.present_values().collect();
        assert_eq!(values, vec!["1", "3"]);
        assert_eq!(column.non_null_count(), 2);
    }

    #[test]
    fn test_values_or_fills_nulls() {
        let column = Column::new(HTN, cells(&[None, Some("1\t")]));
        let values: Vec<&str> = column.values_or("0").collect();
        assert_eq!(values, vec!["0", "1"]);
    }

    #[test]
    fn test_count_matching_uses_declared_default() {
        let column = Column::new(HTN, cells(&[None, Some("0"), Some("1")]));
        assert_eq!(column.count_matching(&["0"]), 2);
        assert_eq!(column.count_matching(&["1"]), 1);
    }

    #[test]
    fn test_from_columns_pads_and_dedups() {
        let dataset = Dataset::from_columns(vec![
            Column::new(HTN, cells(&[Some("1"), Some("0"), Some("1")])),
            Column::new(HLD, cells(&[Some("1")])),
            Column::new(HTN, cells(&[Some("9")])),
        ]);

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column_names().collect::<Vec<_>>(), vec![HTN, HLD]);
        assert_eq!(dataset.column(HLD).map(|c| c.non_null_count()), Some(1));
        assert_eq!(dataset.column(HLD).map(|c| c.values().len()), Some(3));
        assert_eq!(dataset.column(HTN).map(|c| c.count_matching(&["1"])), Some(2));
    }

    #[test]
    fn test_missing_columns() {
        let dataset = Dataset::from_columns(vec![
            Column::new(HTN, cells(&[Some("1")])),
            Column::new("age", cells(&[Some("61")])),
        ]);

        let missing = dataset.missing_columns();
        assert!(!missing.contains(&HTN));
        assert!(missing.contains(&CKD_STAGE));
        assert_eq!(missing.len(), EXPECTED_COLUMNS.len() - 1);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        assert!(dataset.is_empty());
        assert_eq!(dataset.missing_columns().len(), EXPECTED_COLUMNS.len());
    }
}
