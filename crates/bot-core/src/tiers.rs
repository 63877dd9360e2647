use std::collections::BTreeMap;
use std::fmt;

use contracts::TierRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierTableError {
    DuplicateRole(String),
    NegativeThreshold { role_name: String, threshold: i64 },
}

impl fmt::Display for TierTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRole(role_name) => {
                write!(f, "duplicate role name in tier table: {role_name}")
            }
            Self::NegativeThreshold {
                role_name,
                threshold,
            } => write!(
                f,
                "tier {role_name} has negative threshold {threshold}"
            ),
        }
    }
}

impl std::error::Error for TierTableError {}

/// Immutable role/threshold table, fixed at startup. Listing order is
/// declaration order; lookups are by role name.
#[derive(Debug, Clone, Default)]
pub struct TierTable {
    records: Vec<TierRecord>,
    threshold_by_role: BTreeMap<String, i64>,
}

impl TierTable {
    pub fn from_records(records: Vec<TierRecord>) -> Result<Self, TierTableError> {
        let mut threshold_by_role = BTreeMap::new();
        for record in &records {
            if record.point_threshold < 0 {
                return Err(TierTableError::NegativeThreshold {
                    role_name: record.role_name.clone(),
                    threshold: record.point_threshold,
                });
            }
            if threshold_by_role
                .insert(record.role_name.clone(), record.point_threshold)
                .is_some()
            {
                return Err(TierTableError::DuplicateRole(record.role_name.clone()));
            }
        }

        Ok(Self {
            records,
            threshold_by_role,
        })
    }

    pub fn threshold_of(&self, role_name: &str) -> Option<i64> {
        self.threshold_by_role.get(role_name).copied()
    }

    pub fn records(&self) -> &[TierRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order_and_looks_up_by_name() {
        let table = TierTable::from_records(vec![
            TierRecord::new("Legend", 50),
            TierRecord::new("Well-Known", 10),
        ])
        .expect("table builds");

        assert_eq!(table.records()[0].role_name, "Legend");
        assert_eq!(table.threshold_of("Well-Known"), Some(10));
        assert_eq!(table.threshold_of("Unheard-Of"), None);
    }

    #[test]
    fn rejects_duplicate_role_names() {
        let err = TierTable::from_records(vec![
            TierRecord::new("Elite", 30),
            TierRecord::new("Elite", 40),
        ])
        .expect_err("should fail");
        assert_eq!(err, TierTableError::DuplicateRole("Elite".to_string()));
    }

    #[test]
    fn rejects_negative_thresholds() {
        let err = TierTable::from_records(vec![TierRecord::new("Elite", -1)])
            .expect_err("should fail");
        assert!(matches!(err, TierTableError::NegativeThreshold { .. }));
    }
}
