use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::ResourceUsage;

#[derive(Debug)]
pub enum HistoryImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidMonth { category: String, month: String },
}

impl std::fmt::Display for HistoryImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryImportError::Io(err) => write!(f, "failed to read history export: {}", err),
            HistoryImportError::Csv(err) => write!(f, "invalid history CSV data: {}", err),
            HistoryImportError::InvalidMonth { category, month } => write!(
                f,
                "month '{}' for category '{}' is not in YYYY-MM form",
                month, category
            ),
        }
    }
}

impl std::error::Error for HistoryImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryImportError::Io(err) => Some(err),
            HistoryImportError::Csv(err) => Some(err),
            HistoryImportError::InvalidMonth { .. } => None,
        }
    }
}

impl From<std::io::Error> for HistoryImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for HistoryImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct IncidentRow {
    category: String,
    month: String,
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ResourceRow {
    resource_type: String,
    avg_usage: f64,
}

/// Loads historical aggregates exported by the incident dashboard.
pub struct HistoryImporter;

impl HistoryImporter {
    pub fn incidents_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<BTreeMap<String, Vec<u32>>, HistoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::incidents_from_reader(file)
    }

    /// Rows `category,month,count`; months per category come back in ascending order, with
    /// repeated months summed (saturating at `u32::MAX`).
    pub fn incidents_from_reader<R: Read>(
        reader: R,
    ) -> Result<BTreeMap<String, Vec<u32>>, HistoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut by_category: BTreeMap<String, BTreeMap<(i32, u32), u32>> = BTreeMap::new();

        for record in csv_reader.deserialize::<IncidentRow>() {
            let row = record?;
            let month = parse_month(&row.month).ok_or_else(|| HistoryImportError::InvalidMonth {
                category: row.category.clone(),
                month: row.month.clone(),
            })?;
            let total = by_category
                .entry(row.category.to_ascii_lowercase())
                .or_default()
                .entry(month)
                .or_default();
            *total = total.saturating_add(row.count);
        }

        Ok(by_category
            .into_iter()
            .map(|(category, months)| (category, months.into_values().collect()))
            .collect())
    }

    pub fn resources_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ResourceUsage>, HistoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::resources_from_reader(file)
    }

    /// Rows `resource_type,avg_usage`.
    pub fn resources_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<ResourceUsage>, HistoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut usage = Vec::new();
        for record in csv_reader.deserialize::<ResourceRow>() {
            let row = record?;
            usage.push(ResourceUsage {
                resource_type: row.resource_type,
                avg_monthly_usage: row.avg_usage,
            });
        }
        Ok(usage)
    }
}

/// `YYYY-MM`, also accepting a full `YYYY-MM-DD` date.
fn parse_month(value: &str) -> Option<(i32, u32)> {
    let mut parts = value.trim().splitn(3, '-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn incidents_group_by_category_in_month_order() {
        let csv = "category,month,count\n\
Fire,2024-03,14\n\
fire,2024-01,10\n\
medical,2024-02,4\n\
fire,2024-02,12\n\
medical,2024-02,1\n";
        let series = HistoryImporter::incidents_from_reader(Cursor::new(csv)).expect("import");

        assert_eq!(series.get("fire"), Some(&vec![10, 12, 14]));
        assert_eq!(series.get("medical"), Some(&vec![5]));
    }

    #[test]
    fn repeated_months_saturate_instead_of_overflowing() {
        let csv = "category,month,count\n\
fire,2024-01,4000000000\n\
fire,2024-01,4000000000\n\
fire,2024-02,7\n";
        let series = HistoryImporter::incidents_from_reader(Cursor::new(csv)).expect("import");
        assert_eq!(series.get("fire"), Some(&vec![u32::MAX, 7]));
    }

    #[test]
    fn malformed_months_are_reported() {
        let csv = "category,month,count\nrescue,March,3\n";
        match HistoryImporter::incidents_from_reader(Cursor::new(csv)) {
            Err(HistoryImportError::InvalidMonth { category, month }) => {
                assert_eq!(category, "rescue");
                assert_eq!(month, "March");
            }
            other => panic!("expected invalid month, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_counts_are_csv_errors() {
        let csv = "category,month,count\nfire,2024-01,many\n";
        assert!(matches!(
            HistoryImporter::incidents_from_reader(Cursor::new(csv)),
            Err(HistoryImportError::Csv(_))
        ));
    }

    #[test]
    fn resources_parse_average_usage() {
        let csv = "resource_type,avg_usage\nfoam concentrate, 20.5\nbreathing apparatus,8\n";
        let usage = HistoryImporter::resources_from_reader(Cursor::new(csv)).expect("import");
        assert_eq!(usage.len(), 2);
        assert_eq!(usage[0].resource_type, "foam concentrate");
        assert!((usage[0].avg_monthly_usage - 20.5).abs() < f64::EPSILON);
    }
}
