use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use scheme_assist::assistance::{
    Applicant, ApplicantInput, ApplicationInput, AssistanceService, BenefitInput,
    ChildCriteriaInput, Comparator, CriteriaInput, HouseholdMemberInput, InMemoryRepository,
    SchemeInput, SchemeView, SchoolLevel, Validator,
};
use scheme_assist::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for date-of-birth checks (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print the result as JSON instead of a text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EligibilityArgs {
    /// JSON snapshot of the form {"applicant": {...}, "schemes": [...]}
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Reference date for date-of-birth checks (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Print the result as JSON instead of a text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

/// Offline evaluation input: one applicant and the schemes to check.
#[derive(Debug, Deserialize)]
pub(crate) struct EligibilitySnapshot {
    pub(crate) applicant: ApplicantInput,
    #[serde(default)]
    pub(crate) schemes: Vec<SchemeInput>,
}

pub(crate) struct EligibilityOutcome {
    pub(crate) applicant: Applicant,
    pub(crate) considered: usize,
    pub(crate) eligible: Vec<SchemeView>,
}

fn in_memory_service(as_of: Option<NaiveDate>) -> AssistanceService<InMemoryRepository> {
    let validator = as_of.map_or_else(Validator::new, Validator::as_of);
    AssistanceService::with_validator(Arc::new(InMemoryRepository::new()), validator)
}

/// Validate the snapshot, load it into a scratch store, and run the scan.
pub(crate) fn evaluate_snapshot(
    snapshot: EligibilitySnapshot,
    as_of: Option<NaiveDate>,
) -> Result<EligibilityOutcome, AppError> {
    load_snapshot(&in_memory_service(as_of), snapshot)
}

fn load_snapshot(
    service: &AssistanceService<InMemoryRepository>,
    snapshot: EligibilitySnapshot,
) -> Result<EligibilityOutcome, AppError> {
    let applicant = service.register_applicant(snapshot.applicant)?;

    let considered = snapshot.schemes.len();
    for scheme in snapshot.schemes {
        service.create_scheme(scheme)?;
    }

    let eligible = service
        .eligible_schemes(&applicant.id)?
        .into_iter()
        .map(SchemeView::from)
        .collect();

    Ok(EligibilityOutcome {
        applicant,
        considered,
        eligible,
    })
}

pub(crate) fn run_eligibility(args: EligibilityArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input).map_err(|source| AppError::ReadSnapshot {
        path: args.input.clone(),
        source,
    })?;
    let snapshot: EligibilitySnapshot = serde_json::from_str(&raw)?;
    let outcome = evaluate_snapshot(snapshot, args.as_of)?;
    render_outcome(&outcome, args.json)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { as_of, json } = args;

    let service = in_memory_service(as_of);
    let outcome = load_snapshot(&service, demo_snapshot())?;

    if json {
        return render_outcome(&outcome, true);
    }

    println!("Scheme eligibility demo");
    render_outcome(&outcome, false)?;

    let Some(first) = outcome.eligible.first() else {
        println!("\nNo eligible scheme to apply for");
        return Ok(());
    };

    println!("\nApplication intake");
    let input = ApplicationInput {
        applicant_id: outcome.applicant.id.to_string(),
        scheme_id: first.id.to_string(),
    };
    match service.submit_application(input.clone()) {
        Ok(application) => println!(
            "- Application {} recorded for scheme {}",
            application.id, first.name
        ),
        Err(err) => println!("- Application rejected: {err}"),
    }
    match service.submit_application(input) {
        Ok(application) => println!("- Unexpected second application {}", application.id),
        Err(err) => println!("- Repeat submission rejected: {err}"),
    }

    Ok(())
}

fn render_outcome(outcome: &EligibilityOutcome, json: bool) -> Result<(), AppError> {
    if json {
        let payload = serde_json::json!({
            "applicant_id": outcome.applicant.id,
            "eligible_schemes": outcome.eligible,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let applicant = &outcome.applicant;
    println!(
        "Applicant {} ({}), {} household member(s)",
        applicant.name,
        applicant.employment_status.code(),
        applicant.household.len()
    );
    for member in &applicant.household {
        println!(
            "  - {} [{}], school level {}",
            member.name,
            member.relation.code(),
            member.school_level
        );
    }

    println!(
        "\nEligible schemes: {} of {}",
        outcome.eligible.len(),
        outcome.considered
    );
    for scheme in &outcome.eligible {
        let children = scheme
            .criteria
            .has_children
            .as_deref()
            .unwrap_or("no child requirement");
        let employment = match scheme.criteria.employment_status.as_str() {
            "" => "any employment status",
            status => status,
        };
        println!("- {} ({employment}; {children})", scheme.name);
        for benefit in &scheme.benefits {
            println!("    {}: {:.2}", benefit.name, benefit.amount);
        }
    }

    Ok(())
}

fn demo_snapshot() -> EligibilitySnapshot {
    EligibilitySnapshot {
        applicant: ApplicantInput {
            name: "Alice".to_string(),
            employment_status: "employed".to_string(),
            sex: "female".to_string(),
            date_of_birth: "1985-07-22".to_string(),
            household: vec![HouseholdMemberInput {
                id: None,
                name: "Bob".to_string(),
                employment_status: "student".to_string(),
                sex: "male".to_string(),
                date_of_birth: "2012-03-14".to_string(),
                relation: "son".to_string(),
                school_level: SchoolLevel::Secondary.ordinal().into(),
            }],
        },
        schemes: vec![
            SchemeInput {
                name: "Working Parents Education Support".to_string(),
                criteria: CriteriaInput {
                    employment_status: "employed".to_string(),
                    has_children: Some(ChildCriteriaInput {
                        school_level: SchoolLevel::Primary.ordinal().into(),
                        school_level_condition: Comparator::AtLeast.code().into(),
                    }),
                },
                benefits: vec![
                    BenefitInput {
                        id: None,
                        name: "School meal vouchers".to_string(),
                        amount: 120.0,
                    },
                    BenefitInput {
                        id: None,
                        name: "Transport subsidy".to_string(),
                        amount: 45.5,
                    },
                ],
            },
            SchemeInput {
                name: "Retrenchment Assistance".to_string(),
                criteria: CriteriaInput {
                    employment_status: "unemployed".to_string(),
                    has_children: None,
                },
                benefits: vec![BenefitInput {
                    id: None,
                    name: "CDC vouchers".to_string(),
                    amount: 500.0,
                }],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheme_assist::assistance::{AssistanceServiceError, ValidationError};

    fn as_of() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, 6, 1)
    }

    #[test]
    fn demo_snapshot_matches_working_parent_scheme_only() {
        let outcome = evaluate_snapshot(demo_snapshot(), as_of()).expect("demo evaluates");

        assert_eq!(outcome.considered, 2);
        assert_eq!(outcome.eligible.len(), 1);
        assert_eq!(
            outcome.eligible[0].name,
            "Working Parents Education Support"
        );
        assert_eq!(
            outcome.eligible[0].criteria.has_children.as_deref(),
            Some(">= primary")
        );
    }

    #[test]
    fn snapshot_parses_from_json() {
        let snapshot: EligibilitySnapshot = serde_json::from_value(serde_json::json!({
            "applicant": {
                "name": "Carol",
                "employment_status": "unemployed",
                "sex": "female",
                "date_of_birth": "1979-02-11"
            },
            "schemes": [
                { "name": "Retrenchment Assistance", "criteria": { "employment_status": "unemployed" } },
                { "name": "Open Grant" }
            ]
        }))
        .expect("snapshot parses");

        let outcome = evaluate_snapshot(snapshot, as_of()).expect("snapshot evaluates");
        assert_eq!(outcome.eligible.len(), 2);
        assert!(outcome.applicant.household.is_empty());
    }

    #[test]
    fn invalid_snapshot_surfaces_validation_error() {
        let mut snapshot = demo_snapshot();
        snapshot.applicant.household[0].relation = "cousin".to_string();

        match evaluate_snapshot(snapshot, as_of()) {
            Err(AppError::Assistance(AssistanceServiceError::Validation(
                ValidationError::NotAllowed { field, .. },
            ))) => assert_eq!(field, "household[0].relation"),
            Err(other) => panic!("expected validation error, got {other}"),
            Ok(_) => panic!("expected validation error"),
        }
    }
}
