use serde::{Deserialize, Serialize};

use super::super::domain::{Comparator, EmploymentStatus, SchoolLevel};

/// Admission rule attached to a scheme. Both predicates are optional and ANDed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<EmploymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_children: Option<ChildCriteria>,
}

impl Criteria {
    /// Criteria that every applicant satisfies.
    pub const fn open() -> Self {
        Self {
            employment_status: None,
            has_children: None,
        }
    }

    pub fn describe(&self) -> CriteriaDescription {
        CriteriaDescription {
            employment_status: self
                .employment_status
                .map(|status| status.code().to_string())
                .unwrap_or_default(),
            has_children: self.has_children.map(|children| children.describe()),
        }
    }
}

/// Requires a son or daughter whose school level satisfies the comparison.
///
/// The comparator is kept as its storage code so criteria documents written before
/// the comparator vocabulary was enforced still load; see [`ChildCriteria::comparator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCriteria {
    pub school_level: SchoolLevel,
    pub school_level_condition: u8,
}

impl ChildCriteria {
    pub fn new(school_level: SchoolLevel, comparator: Comparator) -> Self {
        Self {
            school_level,
            school_level_condition: comparator.code(),
        }
    }

    pub fn comparator(&self) -> Option<Comparator> {
        Comparator::from_code(self.school_level_condition)
    }

    /// Display form such as `">= secondary"`.
    pub fn describe(&self) -> String {
        let symbol = self.comparator().map_or("?", Comparator::symbol);
        format!("{} {}", symbol, self.school_level.name())
    }
}

/// Human-readable rendering of [`Criteria`] returned alongside schemes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriteriaDescription {
    pub employment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_children: Option<String>,
}
