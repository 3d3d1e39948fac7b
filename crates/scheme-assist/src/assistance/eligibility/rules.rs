use tracing::warn;

use super::super::domain::{EmploymentStatus, HouseholdMember};
use super::criteria::ChildCriteria;

pub(crate) fn employment_matches(
    required: Option<EmploymentStatus>,
    actual: EmploymentStatus,
) -> bool {
    required.map_or(true, |status| status == actual)
}

/// Scan the household in stored order and stop at the first qualifying child.
pub(crate) fn has_qualifying_child(household: &[HouseholdMember], rule: &ChildCriteria) -> bool {
    household
        .iter()
        .filter(|member| member.relation.is_child())
        .any(|child| match rule.comparator() {
            Some(comparator) => comparator.holds(child.school_level, rule.school_level),
            None => {
                warn!(
                    condition = rule.school_level_condition,
                    member_id = %child.id,
                    "unknown school level condition in scheme criteria; treating as non-matching"
                );
                false
            }
        })
}
