use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::workflows::application::router::{next_handler, LocaleParams};
use crate::workflows::lookups::LookupKind;

use super::common::*;

fn section_json<T: serde::Serialize>(section: &T) -> Value {
    serde_json::to_value(section).expect("section serializes")
}

async fn fill_all_steps(router: &axum::Router) {
    let sections = [
        ("personal-information", section_json(&personal_information())),
        ("identity-information", section_json(&identity_information())),
        ("expression-of-interest", section_json(&expression_of_interest())),
        ("consent", section_json(&consent())),
    ];
    for (slug, body) in sections {
        let response = router
            .clone()
            .oneshot(session_request(
                Method::PUT,
                &format!("/api/v1/wizard/{slug}"),
                Some(body),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK, "saving {slug}");
    }
}

#[tokio::test]
async fn lookups_are_localized_and_cached() {
    let backend = Arc::new(MemoryBackend::default());
    backend.seed_lookup(
        LookupKind::Languages,
        vec![
            lookup("lang-fr", "French", "Français", 2),
            lookup("lang-en", "English", "Anglais", 1),
        ],
    );
    let router = router_with(services(backend.clone()));

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(session_request(Method::GET, "/api/v1/lookups/languages?locale=fr", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["locale"], "fr");
        assert_eq!(payload["options"][0]["id"], "lang-en");
        assert_eq!(payload["options"][0]["label"], "Anglais");
    }
    assert_eq!(backend.lookup_calls(), 1);

    let response = router
        .clone()
        .oneshot(session_request(Method::GET, "/api/v1/lookups/planets", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_lookups_surface_backend_status() {
    let backend = Arc::new(MemoryBackend::default());
    let router = router_with(services(backend.clone()));

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/lookups/provinces", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["origin"], "client");
    assert_eq!(payload["details"]["message"], "not found");
}

#[tokio::test]
async fn wizard_requires_a_session() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let response = router
        .oneshot(
            Request::get("/api/v1/wizard")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_first_step_does_not_advance() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let response = router
        .clone()
        .oneshot(session_request(
            Method::PUT,
            "/api/v1/wizard/personal-information",
            Some(json!({
                "firstName": "Jane",
                "lastName": "",
                "email": "bad",
                "birthYear": -5,
                "isProvinceMajorCertified": false,
                "languageId": "",
                "provinceId": "",
                "discoveryChannelId": "",
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(session_request(
            Method::POST,
            "/api/v1/wizard/personal-information/next?locale=fr",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["step"], "personal-information");
    let errors = payload["errors"].as_array().expect("errors listed");
    assert_eq!(errors.len(), 8);
    assert_eq!(errors[0]["href"], "#lastName");

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/wizard/identity-information", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/api/v1/wizard/personal-information")
    );
}

#[tokio::test]
async fn later_steps_redirect_to_first_invalid_step() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let response = router
        .clone()
        .oneshot(session_request(
            Method::PUT,
            "/api/v1/wizard/personal-information",
            Some(section_json(&personal_information())),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/wizard/consent", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let payload = read_json_body(response).await;
    assert_eq!(payload["redirectTo"], "identity-information");
}

#[tokio::test]
async fn mistyped_fields_are_rejected() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let response = router
        .oneshot(session_request(
            Method::PUT,
            "/api/v1/wizard/personal-information",
            Some(json!({ "birthYear": "nineteen ninety" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn null_clears_a_saved_answer() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    for body in [json!({ "additionalInfo": "typo text" }), json!({ "additionalInfo": null })] {
        let response = router
            .clone()
            .oneshot(session_request(
                Method::PUT,
                "/api/v1/wizard/expression-of-interest",
                Some(body),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["state"]["expressionOfInterest"], json!({}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_section_updates_are_all_kept() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let sections = [
        ("personal-information", section_json(&personal_information())),
        ("identity-information", section_json(&identity_information())),
        ("expression-of-interest", section_json(&expression_of_interest())),
        ("consent", section_json(&consent())),
    ];

    for _ in 0..20 {
        let mut updates = Vec::new();
        for (slug, body) in sections.clone() {
            let router = router.clone();
            updates.push(tokio::spawn(async move {
                router
                    .oneshot(session_request(
                        Method::PUT,
                        &format!("/api/v1/wizard/{slug}"),
                        Some(body),
                    ))
                    .await
                    .expect("route executes")
                    .status()
            }));
        }
        for update in updates {
            assert_eq!(update.await.expect("task joins"), StatusCode::OK);
        }

        let response = router
            .clone()
            .oneshot(session_request(Method::GET, "/api/v1/wizard", None))
            .await
            .expect("route executes");
        let payload = read_json_body(response).await;
        assert_eq!(payload["firstInvalidStep"], Value::Null);

        let response = router
            .clone()
            .oneshot(session_request(Method::DELETE, "/api/v1/wizard", None))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
async fn finished_sessions_are_forgotten() {
    let services = services(Arc::new(MemoryBackend::default()));
    let router = router_with(services.clone());

    for n in 0..50 {
        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/wizard")
                    .header(crate::workflows::application::SESSION_HEADER, format!("tab-{n}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(services.sessions.len(), 50);

    let response = router
        .clone()
        .oneshot(
            Request::delete("/api/v1/wizard")
                .header(crate::workflows::application::SESSION_HEADER, "tab-7")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(services.sessions.len(), 49);

    fill_all_steps(&router).await;
    let response = router
        .oneshot(session_request(Method::POST, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(services.sessions.len(), 48);
}

#[tokio::test]
async fn completed_wizard_submits_and_clears_state() {
    let backend = Arc::new(MemoryBackend::default());
    let router = router_with(services(backend.clone()));
    fill_all_steps(&router).await;

    let response = router
        .clone()
        .oneshot(session_request(Method::POST, "/api/v1/wizard/consent/next", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["readyToSubmit"], true);

    let response = router
        .clone()
        .oneshot(session_request(Method::POST, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["applicationId"], "app-1");
    assert_eq!(payload["redirect"], "email-verification");
    assert_eq!(payload["location"], "/application/email-verification");

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["firstInvalidStep"], "personal-information");
    assert_eq!(payload["state"]["personalInformation"], json!({}));
    assert_eq!(backend.created().len(), 1);
}

#[tokio::test]
async fn backend_rejection_keeps_the_wizard_in_place() {
    let backend = Arc::new(MemoryBackend::default());
    backend.fail_creates_with(500);
    let router = router_with(services(backend.clone()));
    fill_all_steps(&router).await;

    let response = router
        .clone()
        .oneshot(session_request(Method::POST, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["origin"], "server");
    assert_eq!(payload["details"]["message"], "rejected");

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["firstInvalidStep"], Value::Null);
    assert_eq!(payload["submissionInFlight"], false);
    assert_eq!(payload["state"]["consent"]["hasGivenConsent"], true);
}

#[tokio::test]
async fn concurrent_submission_is_refused() {
    let services = services(Arc::new(MemoryBackend::default()));
    let router = router_with(services.clone());
    let session = services.sessions.session(SESSION_ID).expect("valid id");
    let _held = session.in_flight.try_acquire().expect("flag free");

    let response = router
        .oneshot(session_request(Method::POST, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelling_discards_answers() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    fill_all_steps(&router).await;

    let response = router
        .clone()
        .oneshot(session_request(Method::DELETE, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(session_request(Method::GET, "/api/v1/wizard/consent", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn next_handler_can_be_called_directly() {
    let services = services(Arc::new(MemoryBackend::default()));
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        crate::workflows::application::SESSION_HEADER,
        SESSION_ID.parse().expect("header value"),
    );

    let response = next_handler::<MemoryBackend>(
        axum::extract::State(services),
        axum::extract::Path("consent".to_string()),
        axum::extract::Query(LocaleParams::default()),
        headers,
    )
    .await;

    match response {
        Ok(response) => assert_eq!(response.status(), StatusCode::SEE_OTHER),
        Err(response) => panic!("expected redirect, got {}", response.status()),
    }
}

#[tokio::test]
async fn email_verification_outcomes() {
    let backend = Arc::new(MemoryBackend::default());
    let router = router_with(services(backend.clone()));
    fill_all_steps(&router).await;
    let response = router
        .clone()
        .oneshot(session_request(Method::POST, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let cases = [
        ("   ", StatusCode::UNPROCESSABLE_ENTITY),
        ("stale-token", StatusCode::NOT_FOUND),
        (KNOWN_ACCESS_TOKEN, StatusCode::OK),
    ];
    for (token, expected) in cases {
        let response = router
            .clone()
            .oneshot(session_request(
                Method::POST,
                "/api/v1/email-validations",
                Some(json!({ "accessToken": token })),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), expected, "token {token:?}");
    }
    assert_eq!(backend.created()[0].is_email_verified, Some(true));
}

#[tokio::test]
async fn management_requires_a_bearer_token() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let response = router
        .oneshot(
            Request::get("/api/v1/management/applications")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["signIn"], "/auth/signin");
}

#[tokio::test]
async fn expired_tokens_send_administrators_to_sign_in() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let response = router
        .oneshot(
            Request::get("/api/v1/management/applications")
                .header(header::AUTHORIZATION, "Bearer expired")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json_body(response).await["signIn"], "/auth/signin");
}

#[tokio::test]
async fn administrators_review_and_select_applications() {
    let backend = Arc::new(MemoryBackend::default());
    let router = router_with(services(backend.clone()));
    fill_all_steps(&router).await;
    let response = router
        .clone()
        .oneshot(session_request(Method::POST, "/api/v1/wizard", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .clone()
        .oneshot(admin_request(Method::GET, "/api/v1/management/applications?size=10", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["applications"][0]["id"], "app-1");
    assert_eq!(payload["applications"][0]["firstName"], "Jane");

    let response = router
        .clone()
        .oneshot(admin_request(Method::GET, "/api/v1/management/applications/app-9", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(admin_request(
            Method::PUT,
            "/api/v1/management/applications/app-1/status",
            Some(json!({ "statusId": "approved" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["errors"][0]["path"], "reason");

    let response = router
        .clone()
        .oneshot(admin_request(Method::POST, "/api/v1/management/selections/0", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .clone()
        .oneshot(admin_request(Method::POST, "/api/v1/management/selections/3", None))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["selected"], 1);
    assert_eq!(payload["shortfall"], 2);
    assert_eq!(payload["applicationIds"], json!(["app-1"]));

    let response = router
        .oneshot(admin_request(
            Method::PUT,
            "/api/v1/management/applications/app-1/status",
            Some(json!({ "statusId": "approved", "reason": "Strong local ties" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["statusId"], "approved");
}

#[tokio::test]
async fn management_errors_follow_the_requested_locale() {
    let router = router_with(services(Arc::new(MemoryBackend::default())));
    let mut messages = Vec::new();
    for uri in [
        "/api/v1/management/applications/app-1/status",
        "/api/v1/management/applications/app-1/status?locale=fr",
    ] {
        let response = router
            .clone()
            .oneshot(admin_request(
                Method::PUT,
                uri,
                Some(json!({ "statusId": "approved" })),
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        assert_eq!(payload["errors"][0]["path"], "reason");
        messages.push(payload["errors"][0]["message"].clone());
    }
    assert_ne!(messages[0], messages[1]);

    let response = router
        .oneshot(admin_request(
            Method::POST,
            "/api/v1/management/selections/0?locale=fr",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
