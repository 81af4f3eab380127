use std::collections::{BTreeMap, btree_map::Entry};

use crate::types::{CourseRecord, Field};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FilterError(String);

/// URL slug for a department code: `"INT D"` becomes `"int_d"`.
pub fn department_slug(department: &str) -> String {
    department
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[derive(Debug, Default)]
pub struct RecordFilter {
    pub department: Option<String>,
    pub term: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RecordFilter {
    pub fn apply(self, mut records: Vec<CourseRecord>) -> Vec<CourseRecord> {
        if let Some(department) = self.department {
            let wanted = department.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
            records.retain(|r| r.department.as_option() == Some(&wanted));
        }
        if let Some(term) = self.term {
            let needle = term.to_lowercase();
            records.retain(|r| {
                r.units
                    .term
                    .as_option()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            });
        }
        if let Some(off) = self.offset {
            records = records.into_iter().skip(off).collect();
        }
        if let Some(lim) = self.limit {
            records.truncate(lim);
        }
        records
    }

    pub fn validate(self) -> Result<Self, FilterError> {
        if self.limit.is_some_and(|l| l == 0) {
            return Err(FilterError("Limit must be greater than 0".to_string()));
        }
        if self.department.as_ref().is_some_and(|d| d.trim().is_empty()) {
            return Err(FilterError("Department filter must not be empty".to_string()));
        }
        if self.term.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(FilterError("Term filter must not be empty".to_string()));
        }
        Ok(self)
    }
}

/// Records keyed by course code for a key-value store. Records without a code
/// are skipped and the first record wins on duplicates.
pub fn index_by_course_code(records: &[CourseRecord]) -> BTreeMap<String, CourseRecord> {
    let mut index = BTreeMap::new();
    for record in records {
        let Field::Known(code) = &record.course_code else {
            continue;
        };
        match index.entry(code.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
            Entry::Occupied(_) => log::warn!("Duplicate course code {}, keeping first", code),
        }
    }
    index
}

#[derive(Debug)]
pub struct CatalogueStats {
    pub total: usize,
    pub with_units: usize,
    pub without_code: usize,
    pub departments: BTreeMap<String, usize>,
}

impl CatalogueStats {
    pub fn from_records(records: &[CourseRecord]) -> CatalogueStats {
        let mut departments = BTreeMap::new();
        for department in records.iter().filter_map(|r| r.department.as_option()) {
            *departments.entry(department.clone()).or_insert(0) += 1;
        }

        CatalogueStats {
            total: records.len(),
            with_units: records.iter().filter(|r| !r.units.is_unknown()).count(),
            without_code: records.iter().filter(|r| r.course_code.is_unknown()).count(),
            departments,
        }
    }
}

impl std::fmt::Display for CatalogueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        for (department, count) in &self.departments {
            writeln!(f, "  {:<28}{}", format!("{} courses:", department), count)?;
        }
        writeln!(f, "  With units line:            {}", self.with_units)?;
        writeln!(f, "  Missing course code:        {}", self.without_code)?;
        writeln!(f, "  Total:                      {}", self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Units;

    fn record(code: Option<&str>, department: Option<&str>, term: Option<&str>) -> CourseRecord {
        CourseRecord {
            department: department.map(str::to_string).into(),
            course_code: code.map(str::to_string).into(),
            units: Units {
                credits: term.map(|_| 3.0).into(),
                fee_index: term.map(|_| 6).into(),
                term: term.map(str::to_string).into(),
            },
            ..CourseRecord::default()
        }
    }

    fn sample() -> Vec<CourseRecord> {
        vec![
            record(Some("CMPUT 174"), Some("cmput"), Some("either term")),
            record(Some("INT D 410"), Some("int d"), Some("Fall")),
            record(None, None, Some("winter")),
            record(Some("CMPUT 174"), Some("cmput"), None),
            record(Some("CMPUT 201"), Some("cmput"), Some("either term")),
        ]
    }

    #[test]
    fn test_department_slug() {
        assert_eq!(department_slug("CMPUT"), "cmput");
        assert_eq!(department_slug("INT D"), "int_d");
        assert_eq!(department_slug("  soc   d "), "soc_d");
        assert_eq!(department_slug(""), "");
    }

    #[test]
    fn test_filter_by_department() {
        let filter = RecordFilter {
            department: Some("INT  D".to_string()),
            ..RecordFilter::default()
        };
        let records = filter.apply(sample());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].course_code, Field::Known("INT D 410".to_string()));
    }

    #[test]
    fn test_filter_by_term_ignores_case() {
        let filter = RecordFilter {
            term: Some("FALL".to_string()),
            ..RecordFilter::default()
        };
        assert_eq!(filter.apply(sample()).len(), 1);
    }

    #[test]
    fn test_filter_offset_then_limit() {
        let filter = RecordFilter {
            offset: Some(1),
            limit: Some(2),
            ..RecordFilter::default()
        };
        let records = filter.apply(sample());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].course_code, Field::Known("INT D 410".to_string()));
        assert!(records[1].course_code.is_unknown());
    }

    #[test]
    fn test_filter_validate() {
        assert!(RecordFilter::default().validate().is_ok());
        assert!(
            RecordFilter {
                limit: Some(0),
                ..RecordFilter::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            RecordFilter {
                term: Some("  ".to_string()),
                ..RecordFilter::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_index_by_course_code() {
        let index = index_by_course_code(&sample());

        assert_eq!(index.len(), 3);
        assert!(index.contains_key("INT D 410"));
        assert!(index["CMPUT 174"].units.term.is_known(), "first duplicate wins");
    }

    #[test]
    fn test_stats() {
        let stats = CatalogueStats::from_records(&sample());

        assert_eq!(stats.total, 5);
        assert_eq!(stats.with_units, 4);
        assert_eq!(stats.without_code, 1);
        assert_eq!(stats.departments.get("cmput"), Some(&3));
        assert_eq!(stats.departments.get("int d"), Some(&1));
        assert!(stats.to_string().contains("Total:"));
    }
}
