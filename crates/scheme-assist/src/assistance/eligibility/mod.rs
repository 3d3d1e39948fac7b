mod criteria;
mod rules;

pub use criteria::{ChildCriteria, Criteria, CriteriaDescription};

use super::domain::{Applicant, Scheme};
use tracing::debug;

/// Decide whether `applicant` satisfies `criteria`.
///
/// The employment predicate short-circuits before the household is inspected. An
/// unknown comparator code never matches and is logged rather than raised.
pub fn is_eligible(applicant: &Applicant, criteria: &Criteria) -> bool {
    if !rules::employment_matches(criteria.employment_status, applicant.employment_status) {
        return false;
    }

    match &criteria.has_children {
        None => true,
        Some(rule) => rules::has_qualifying_child(&applicant.household, rule),
    }
}

/// Keep the schemes `applicant` qualifies for, preserving the input order.
pub fn scan_schemes<I>(applicant: &Applicant, schemes: I) -> Vec<Scheme>
where
    I: IntoIterator<Item = Scheme>,
{
    let eligible: Vec<Scheme> = schemes
        .into_iter()
        .filter(|scheme| is_eligible(applicant, &scheme.criteria))
        .collect();

    debug!(
        applicant_id = %applicant.id,
        eligible = eligible.len(),
        "scheme eligibility scan complete"
    );

    eligible
}
