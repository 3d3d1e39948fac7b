use chrono::{NaiveDate, Utc};

use super::domain::{
    ApplicantDraft, ApplicantInput, BenefitDraft, BenefitId, BenefitInput, ChildCriteriaInput,
    Comparator, CriteriaInput, EmploymentStatus, HouseholdMemberDraft, HouseholdMemberId,
    HouseholdMemberInput, Relation, SchemeDraft, SchemeInput, SchoolLevel, Sex,
};
use super::eligibility::{ChildCriteria, Criteria};

/// First rule violated by an inbound record. `field` carries the nested path,
/// e.g. `household[1].relation`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    Empty { field: String },
    #[error("invalid {field} '{value}', must be one of: {allowed}")]
    NotAllowed {
        field: String,
        value: String,
        allowed: String,
    },
    #[error("invalid {field} format '{value}', expected YYYY-MM-DD")]
    DateFormat { field: String, value: String },
    #[error("invalid {field} value '{value}'")]
    InvalidDate { field: String, value: String },
    #[error("{field} {value} cannot be in the future")]
    FutureDate { field: String, value: NaiveDate },
    #[error("{field} must be greater than zero (found {value})")]
    NonPositiveAmount { field: String, value: f64 },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Empty { field }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::DateFormat { field, .. }
            | ValidationError::InvalidDate { field, .. }
            | ValidationError::FutureDate { field, .. }
            | ValidationError::NonPositiveAmount { field, .. } => field,
        }
    }
}

/// Storage-free validator turning inbound records into typed drafts.
///
/// Dates of birth are checked against the current UTC date unless a fixed reference
/// date is supplied with [`Validator::as_of`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    reference_date: Option<NaiveDate>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_of(reference_date: NaiveDate) -> Self {
        Self {
            reference_date: Some(reference_date),
        }
    }

    fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn applicant(&self, input: &ApplicantInput) -> Result<ApplicantDraft, ValidationError> {
        let person = self.person(
            "",
            &input.name,
            &input.employment_status,
            &input.sex,
            &input.date_of_birth,
        )?;

        let household = input
            .household
            .iter()
            .enumerate()
            .map(|(index, member)| self.household_member(&format!("household[{index}]."), member))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApplicantDraft {
            name: person.name,
            employment_status: person.employment_status,
            sex: person.sex,
            date_of_birth: person.date_of_birth,
            household,
        })
    }

    /// `prefix` is prepended to field names in errors (`""` for a standalone member).
    pub fn household_member(
        &self,
        prefix: &str,
        input: &HouseholdMemberInput,
    ) -> Result<HouseholdMemberDraft, ValidationError> {
        let person = self.person(
            prefix,
            &input.name,
            &input.employment_status,
            &input.sex,
            &input.date_of_birth,
        )?;

        let relation = Relation::from_code(&input.relation).ok_or_else(|| {
            not_allowed(
                prefix,
                "relation",
                &input.relation,
                Relation::ALL.iter().map(|relation| relation.code()),
            )
        })?;

        let school_level = school_level(prefix, input.school_level)?;

        Ok(HouseholdMemberDraft {
            id: non_blank(input.id.as_deref()).map(HouseholdMemberId::from),
            name: person.name,
            employment_status: person.employment_status,
            sex: person.sex,
            date_of_birth: person.date_of_birth,
            relation,
            school_level,
        })
    }

    pub fn scheme(&self, input: &SchemeInput) -> Result<SchemeDraft, ValidationError> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "name".to_string(),
            });
        }

        let criteria = criteria(&input.criteria)?;

        let benefits = input
            .benefits
            .iter()
            .enumerate()
            .map(|(index, benefit)| self.benefit(&format!("benefits[{index}]."), benefit))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SchemeDraft {
            name: input.name.clone(),
            criteria,
            benefits,
        })
    }

    pub fn benefit(
        &self,
        prefix: &str,
        input: &BenefitInput,
    ) -> Result<BenefitDraft, ValidationError> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: format!("{prefix}name"),
            });
        }

        if !input.amount.is_finite() || input.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount {
                field: format!("{prefix}amount"),
                value: input.amount,
            });
        }

        Ok(BenefitDraft {
            id: non_blank(input.id.as_deref()).map(BenefitId::from),
            name: input.name.clone(),
            amount: input.amount,
        })
    }

    fn person(
        &self,
        prefix: &str,
        name: &str,
        employment_status: &str,
        sex: &str,
        date_of_birth: &str,
    ) -> Result<PersonFields, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: format!("{prefix}name"),
            });
        }

        let employment_status = EmploymentStatus::from_code(employment_status).ok_or_else(|| {
            not_allowed(
                prefix,
                "employment_status",
                employment_status,
                EmploymentStatus::ALL.iter().map(|status| status.code()),
            )
        })?;

        let sex = Sex::from_code(sex).ok_or_else(|| {
            not_allowed(prefix, "sex", sex, Sex::ALL.iter().map(|sex| sex.code()))
        })?;

        let date_of_birth = self.date_of_birth(prefix, date_of_birth)?;

        Ok(PersonFields {
            name: name.to_string(),
            employment_status,
            sex,
            date_of_birth,
        })
    }

    fn date_of_birth(&self, prefix: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
        let field = format!("{prefix}date_of_birth");

        if !has_iso_date_shape(raw) {
            return Err(ValidationError::DateFormat {
                field,
                value: raw.to_string(),
            });
        }

        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidDate {
                field: field.clone(),
                value: raw.to_string(),
            }
        })?;

        if date > self.today() {
            return Err(ValidationError::FutureDate { field, value: date });
        }

        Ok(date)
    }
}

struct PersonFields {
    name: String,
    employment_status: EmploymentStatus,
    sex: Sex,
    date_of_birth: NaiveDate,
}

fn criteria(input: &CriteriaInput) -> Result<Criteria, ValidationError> {
    let employment_status = match input.employment_status.as_str() {
        "" => None,
        code => {
            let status = EmploymentStatus::from_code(code)
                .filter(|status| EmploymentStatus::SCHEME_TARGETS.contains(status))
                .ok_or_else(|| {
                    not_allowed(
                        "criteria.",
                        "employment_status",
                        code,
                        EmploymentStatus::SCHEME_TARGETS
                            .iter()
                            .map(|status| status.code()),
                    )
                })?;
            Some(status)
        }
    };

    let has_children = input.has_children.map(child_criteria).transpose()?;

    Ok(Criteria {
        employment_status,
        has_children,
    })
}

fn child_criteria(input: ChildCriteriaInput) -> Result<ChildCriteria, ValidationError> {
    let level = school_level("criteria.has_children.", input.school_level)?;
    let comparator = narrow(input.school_level_condition)
        .and_then(Comparator::from_code)
        .ok_or_else(|| ValidationError::NotAllowed {
            field: "criteria.has_children.school_level_condition".to_string(),
            value: input.school_level_condition.to_string(),
            allowed: Comparator::ALL
                .iter()
                .map(|comparator| format!("{} ({})", comparator.code(), comparator.symbol()))
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    Ok(ChildCriteria::new(level, comparator))
}

fn narrow(code: i64) -> Option<u8> {
    u8::try_from(code).ok()
}

fn school_level(prefix: &str, code: i64) -> Result<SchoolLevel, ValidationError> {
    narrow(code)
        .and_then(SchoolLevel::from_ordinal)
        .ok_or_else(|| ValidationError::NotAllowed {
            field: format!("{prefix}school_level"),
            value: code.to_string(),
            allowed: SchoolLevel::ALL
                .iter()
                .map(|level| format!("{} ({})", level.ordinal(), level.name()))
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn not_allowed<'a>(
    prefix: &str,
    field: &str,
    value: &str,
    allowed: impl Iterator<Item = &'a str>,
) -> ValidationError {
    ValidationError::NotAllowed {
        field: format!("{prefix}{field}"),
        value: value.to_string(),
        allowed: allowed.collect::<Vec<_>>().join(", "),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// `chrono` accepts unpadded fields, so the `NNNN-NN-NN` shape is checked first.
fn has_iso_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}
