use serde::Serialize;

use super::domain::{Benefit, Scheme, SchemeId};
use super::eligibility::CriteriaDescription;

/// Scheme as presented to API callers, with the criteria rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeView {
    pub id: SchemeId,
    pub name: String,
    pub criteria: CriteriaDescription,
    pub benefits: Vec<Benefit>,
}

impl From<Scheme> for SchemeView {
    fn from(scheme: Scheme) -> Self {
        Self {
            criteria: scheme.criteria.describe(),
            id: scheme.id,
            name: scheme.name,
            benefits: scheme.benefits,
        }
    }
}

pub fn scheme_views(schemes: Vec<Scheme>) -> Vec<SchemeView> {
    schemes.into_iter().map(SchemeView::from).collect()
}
