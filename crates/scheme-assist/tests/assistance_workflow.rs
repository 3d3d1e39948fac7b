//! End-to-end scenarios for registration, scheme setup, eligibility, and applications.
//!
//! Everything goes through the public service facade and HTTP router.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use scheme_assist::assistance::{
        ApplicantInput, AssistanceService, BenefitInput, ChildCriteriaInput, CriteriaInput,
        HouseholdMemberInput, InMemoryRepository, SchemeInput, Validator,
    };

    pub(super) fn service() -> Arc<AssistanceService<InMemoryRepository>> {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        Arc::new(AssistanceService::with_validator(
            Arc::new(InMemoryRepository::new()),
            Validator::as_of(as_of),
        ))
    }

    pub(super) fn applicant(name: &str, employment_status: &str, children: &[u8]) -> ApplicantInput {
        ApplicantInput {
            name: name.to_string(),
            employment_status: employment_status.to_string(),
            sex: "female".to_string(),
            date_of_birth: "1984-11-03".to_string(),
            household: children
                .iter()
                .enumerate()
                .map(|(index, level)| HouseholdMemberInput {
                    id: None,
                    name: format!("{name} child {index}"),
                    employment_status: "student".to_string(),
                    sex: "male".to_string(),
                    date_of_birth: "2013-04-18".to_string(),
                    relation: "son".to_string(),
                    school_level: (*level).into(),
                })
                .collect(),
        }
    }

    pub(super) fn scheme(
        name: &str,
        employment_status: &str,
        children: Option<(u8, u8)>,
    ) -> SchemeInput {
        SchemeInput {
            name: name.to_string(),
            criteria: CriteriaInput {
                employment_status: employment_status.to_string(),
                has_children: children.map(|(school_level, school_level_condition)| {
                    ChildCriteriaInput {
                        school_level: school_level.into(),
                        school_level_condition: school_level_condition.into(),
                    }
                }),
            },
            benefits: vec![BenefitInput {
                id: None,
                name: format!("{name} payout"),
                amount: 250.0,
            }],
        }
    }
}

mod eligibility {
    use super::common::*;

    use scheme_assist::assistance::{ApplicationFilter, ApplicationInput, AssistanceServiceError};

    #[test]
    fn applicants_see_only_the_schemes_they_qualify_for() {
        let service = service();
        let alice = service
            .register_applicant(applicant("Alice", "employed", &[3]))
            .expect("alice registers");
        let carol = service
            .register_applicant(applicant("Carol", "unemployed", &[]))
            .expect("carol registers");

        let s1 = service
            .create_scheme(scheme("S1", "employed", Some((2, 2))))
            .expect("s1");
        let s2 = service
            .create_scheme(scheme("S2", "unemployed", None))
            .expect("s2");
        let open = service.create_scheme(scheme("Open", "", None)).expect("open");

        let for_alice: Vec<_> = service
            .eligible_schemes(&alice.id)
            .expect("alice scan")
            .into_iter()
            .map(|scheme| scheme.id)
            .collect();
        assert_eq!(for_alice, vec![s1.id.clone(), open.id.clone()]);

        let for_carol: Vec<_> = service
            .eligible_schemes(&carol.id)
            .expect("carol scan")
            .into_iter()
            .map(|scheme| scheme.id)
            .collect();
        assert_eq!(for_carol, vec![s2.id, open.id]);

        service
            .submit_application(ApplicationInput {
                applicant_id: alice.id.to_string(),
                scheme_id: s1.id.to_string(),
            })
            .expect("alice applies");

        let duplicate = service.submit_application(ApplicationInput {
            applicant_id: alice.id.to_string(),
            scheme_id: s1.id.to_string(),
        });
        assert!(matches!(
            duplicate,
            Err(AssistanceServiceError::DuplicateApplication { .. })
        ));

        service.delete_applicant(&alice.id).expect("alice removed");
        assert!(service
            .applications(&ApplicationFilter::default())
            .expect("list")
            .is_empty());
    }
}

mod routing {
    use super::common::*;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use scheme_assist::assistance::assistance_router;

    async fn json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn registration_then_scan_over_http() {
        let service = service();
        service
            .create_scheme(scheme("Primary support", "", Some((2, 1))))
            .expect("scheme");
        let router = assistance_router(service);

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/applicants")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&applicant("Dana", "student", &[2])).expect("payload"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json(response).await;
        let id = created["applicant"]["id"].as_str().expect("id").to_string();

        let response = router
            .oneshot(
                Request::get(format!("/api/applicants/{id}/eligible-schemes"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["eligible_schemes"][0]["name"], "Primary support");
        assert_eq!(body["eligible_schemes"][0]["criteria"]["has_children"], "== primary");
    }
}
