use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::eligibility::Criteria;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Allocate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

record_id!(
    /// Identifier of a registered applicant.
    ApplicantId
);
record_id!(
    /// Identifier of a household member, unique across applicants.
    HouseholdMemberId
);
record_id!(
    /// Identifier of an assistance scheme.
    SchemeId
);
record_id!(BenefitId);
record_id!(
    /// Identifier of an applicant-to-scheme application.
    ApplicationId
);

/// Employment vocabulary shared by applicants and household members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    #[serde(rename = "employed")]
    Employed,
    #[serde(rename = "unemployed")]
    Unemployed,
    #[serde(rename = "student")]
    Student,
    #[serde(rename = "ns")]
    NationalService,
}

impl EmploymentStatus {
    pub const ALL: [Self; 4] = [
        Self::Employed,
        Self::Unemployed,
        Self::Student,
        Self::NationalService,
    ];

    /// Statuses a scheme is allowed to target.
    pub const SCHEME_TARGETS: [Self; 2] = [Self::Employed, Self::Unemployed];

    pub const fn code(self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "employed",
            EmploymentStatus::Unemployed => "unemployed",
            EmploymentStatus::Student => "student",
            EmploymentStatus::NationalService => "ns",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    pub const fn code(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sex| sex.code() == code)
    }
}

/// Relationship of a household member to the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Son,
    Daughter,
    Father,
    Mother,
    Husband,
    Wife,
    Brother,
    Sister,
}

impl Relation {
    pub const ALL: [Self; 8] = [
        Self::Son,
        Self::Daughter,
        Self::Father,
        Self::Mother,
        Self::Husband,
        Self::Wife,
        Self::Brother,
        Self::Sister,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Relation::Son => "son",
            Relation::Daughter => "daughter",
            Relation::Father => "father",
            Relation::Mother => "mother",
            Relation::Husband => "husband",
            Relation::Wife => "wife",
            Relation::Brother => "brother",
            Relation::Sister => "sister",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|relation| relation.code() == code)
    }

    /// Only sons and daughters count towards child-related criteria.
    pub const fn is_child(self) -> bool {
        matches!(self, Relation::Son | Relation::Daughter)
    }
}

/// Education stage, ordered by ordinal.
///
/// ITE, JC and polytechnic are parallel tracks in practice, but eligibility treats the
/// seven levels as one total order by their ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SchoolLevel {
    Preschool = 1,
    Primary = 2,
    Secondary = 3,
    Ite = 4,
    Jc = 5,
    Polytechnic = 6,
    University = 7,
}

impl SchoolLevel {
    pub const ALL: [Self; 7] = [
        Self::Preschool,
        Self::Primary,
        Self::Secondary,
        Self::Ite,
        Self::Jc,
        Self::Polytechnic,
        Self::University,
    ];

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.ordinal() == ordinal)
    }

    pub const fn name(self) -> &'static str {
        match self {
            SchoolLevel::Preschool => "preschool",
            SchoolLevel::Primary => "primary",
            SchoolLevel::Secondary => "secondary",
            SchoolLevel::Ite => "ite",
            SchoolLevel::Jc => "jc",
            SchoolLevel::Polytechnic => "polytechnic",
            SchoolLevel::University => "university",
        }
    }
}

impl fmt::Display for SchoolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for SchoolLevel {
    type Error = UnknownCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(value).ok_or(UnknownCode {
            vocabulary: "school level",
            code: value,
        })
    }
}

impl From<SchoolLevel> for u8 {
    fn from(value: SchoolLevel) -> Self {
        value.ordinal()
    }
}

/// Integer code outside a fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} code {code}")]
pub struct UnknownCode {
    pub vocabulary: &'static str,
    pub code: u8,
}

/// Comparison applied between a child's school level and a scheme's target level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Equal,
    AtLeast,
    AtMost,
    Above,
    Below,
}

impl Comparator {
    pub const ALL: [Self; 5] = [
        Self::Equal,
        Self::AtLeast,
        Self::AtMost,
        Self::Above,
        Self::Below,
    ];

    /// Storage code, matching the persisted criteria documents.
    pub const fn code(self) -> u8 {
        match self {
            Comparator::Equal => 1,
            Comparator::AtLeast => 2,
            Comparator::AtMost => 3,
            Comparator::Above => 4,
            Comparator::Below => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|comparator| comparator.code() == code)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Comparator::Equal => "==",
            Comparator::AtLeast => ">=",
            Comparator::AtMost => "<=",
            Comparator::Above => ">",
            Comparator::Below => "<",
        }
    }

    /// Evaluate `child <op> target` over the school level ordering.
    pub fn holds(self, child: SchoolLevel, target: SchoolLevel) -> bool {
        match self {
            Comparator::Equal => child == target,
            Comparator::AtLeast => child >= target,
            Comparator::AtMost => child <= target,
            Comparator::Above => child > target,
            Comparator::Below => child < target,
        }
    }
}

/// Registered applicant together with their household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub id: ApplicantId,
    pub name: String,
    pub employment_status: EmploymentStatus,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub household: Vec<HouseholdMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdMember {
    pub id: HouseholdMemberId,
    pub applicant_id: ApplicantId,
    pub name: String,
    pub employment_status: EmploymentStatus,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub relation: Relation,
    pub school_level: SchoolLevel,
}

/// Assistance programme with its eligibility rule and benefits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: SchemeId,
    pub name: String,
    pub criteria: Criteria,
    pub benefits: Vec<Benefit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: BenefitId,
    pub scheme_id: SchemeId,
    pub name: String,
    pub amount: f64,
}

/// Link between one applicant and one scheme. At most one per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: ApplicantId,
    pub scheme_id: SchemeId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated applicant registration or update payload.
///
/// Every field defaults when absent so that gaps surface as [`Validator`] errors
/// naming the field rather than as body rejections. Integer codes are read wide for
/// the same reason.
///
/// [`Validator`]: super::validation::Validator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantInput {
    pub name: String,
    pub employment_status: String,
    pub sex: String,
    pub date_of_birth: String,
    pub household: Vec<HouseholdMemberInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdMemberInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub employment_status: String,
    pub sex: String,
    pub date_of_birth: String,
    pub relation: String,
    pub school_level: i64,
}

/// Unvalidated scheme definition payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeInput {
    pub name: String,
    pub criteria: CriteriaInput,
    pub benefits: Vec<BenefitInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaInput {
    pub employment_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_children: Option<ChildCriteriaInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildCriteriaInput {
    pub school_level: i64,
    pub school_level_condition: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenefitInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationInput {
    pub applicant_id: String,
    pub scheme_id: String,
}

/// Validated applicant fields, not yet bound to stored identities.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantDraft {
    pub name: String,
    pub employment_status: EmploymentStatus,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub household: Vec<HouseholdMemberDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HouseholdMemberDraft {
    pub id: Option<HouseholdMemberId>,
    pub name: String,
    pub employment_status: EmploymentStatus,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    pub relation: Relation,
    pub school_level: SchoolLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemeDraft {
    pub name: String,
    pub criteria: Criteria,
    pub benefits: Vec<BenefitDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenefitDraft {
    pub id: Option<BenefitId>,
    pub name: String,
    pub amount: f64,
}

/// Optional narrowing for application listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub applicant_id: Option<ApplicantId>,
    pub scheme_id: Option<SchemeId>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        self.applicant_id
            .as_ref()
            .map_or(true, |id| *id == application.applicant_id)
            && self
                .scheme_id
                .as_ref()
                .map_or(true, |id| *id == application.scheme_id)
    }
}
