//! HTTP contract tests over the full routing, session, and error-mapping
//! stack, with the domain behind deterministic doubles.

mod support;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};
use uuid::Uuid;

use canvassing_backend::domain::Error;
use canvassing_backend::domain::user::Role;

use support::{TestHarness, login_as, profile, test_app};

#[actix_web::test]
async fn login_establishes_a_session_and_me_returns_the_profile() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(body["email"], "pat@corp.example");
    assert_eq!(body["role"], "PURCHASER");
}

#[actix_web::test]
async fn bad_credentials_return_the_uniform_error_payload() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser])).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(json!({ "email": "pat@corp.example", "password": "wrong" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["code"], "unauthorized");
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn endpoints_require_a_session() {
    let app = test_app(TestHarness::new(vec![])).await;
    for uri in [
        "/api/v1/tickets",
        "/api/v1/notifications",
        "/api/v1/dashboard",
    ] {
        let response =
            test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[actix_web::test]
async fn creating_a_ticket_returns_the_wire_shape() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let reviewer = profile("rae@corp.example", Role::Reviewer);
    let app =
        test_app(TestHarness::new(vec![purchaser.clone(), reviewer.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/tickets")
            .cookie(cookie)
            .set_json(json!({
                "itemName": "laptops",
                "itemDescription": "14 inch developer laptops",
                "quantity": 3,
                "reviewers": [reviewer.id.to_string()],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["itemName"], "laptops");
    assert_eq!(body["quantity"], 3);
    assert_eq!(body["status"], "FOR CANVASS");
    assert_eq!(body["createdBy"], purchaser.id.to_string());
    assert!(body["name"].as_str().expect("name").starts_with("PT-"));
}

#[actix_web::test]
async fn malformed_ticket_payloads_are_bad_requests() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/tickets")
            .cookie(cookie)
            .set_json(json!({
                "itemName": "  ",
                "quantity": 1,
                "reviewers": [Uuid::new_v4().to_string()],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["code"], "invalid_request");
}

#[actix_web::test]
async fn lost_transitions_surface_as_conflicts_with_details() {
    let manager = profile("max@corp.example", Role::Manager);
    let mut harness = TestHarness::new(vec![manager.clone()]);
    harness.tickets.apply_error = Some(
        Error::conflict("ticket status changed").with_details(json!({
            "expected": "FOR APPROVAL",
            "actual": "CANCELED",
            "code": "status_conflict",
        })),
    );
    let app = test_app(harness).await;
    let cookie = login_as(&app, &manager).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/tickets/{}/actions", Uuid::new_v4()))
            .cookie(cookie)
            .set_json(json!({ "action": "approve" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["code"], "conflict");
    assert_eq!(body["details"]["actual"], "CANCELED");
}

#[actix_web::test]
async fn stale_draft_saves_report_the_actual_revision() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let mut harness = TestHarness::new(vec![purchaser.clone()]);
    harness.drafts.stale_actual = Some(5);
    let app = test_app(harness).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/tickets/{}/draft", Uuid::new_v4()))
            .cookie(cookie)
            .set_json(json!({
                "form": { "supplierName": "Acme" },
                "expectedRevision": 2,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["details"]["actualRevision"], 5);
}

#[actix_web::test]
async fn autosaves_increment_the_reported_revision() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/tickets/{}/draft", Uuid::new_v4()))
            .cookie(cookie)
            .set_json(json!({
                "form": { "supplierName": "Acme" },
                "expectedRevision": 2,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(body["revision"], 3);
}

#[actix_web::test]
async fn raw_body_uploads_return_the_staged_metadata() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!(
                "/api/v1/tickets/{}/uploads?kind=quotation&fileName=quote.pdf",
                Uuid::new_v4()
            ))
            .cookie(cookie)
            .insert_header(("content-type", "application/pdf"))
            .set_payload(vec![1_u8, 2, 3, 4])
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["kind"], "quotation");
    assert_eq!(body["fileName"], "quote.pdf");
    assert_eq!(body["sizeBytes"], 4);
}

#[actix_web::test]
async fn unknown_upload_kinds_are_rejected() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!(
                "/api/v1/tickets/{}/uploads?kind=invoice&fileName=x.pdf",
                Uuid::new_v4()
            ))
            .cookie(cookie)
            .set_payload(vec![1_u8])
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn submitting_a_canvass_form_returns_the_stored_form() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/tickets/{}/canvass", Uuid::new_v4()))
            .cookie(cookie)
            .set_json(json!({
                "supplierName": "Acme Industrial",
                "rfDateReceived": "2026-08-01",
                "leadTimeDays": 14,
                "paymentTerms": "NET 30",
                "totalAmountCents": 125000,
                "uploadIds": [Uuid::new_v4().to_string(), Uuid::new_v4().to_string()],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["supplierName"], "Acme Industrial");
    assert_eq!(body["totalAmountCents"], 125_000);
}

#[actix_web::test]
async fn review_decisions_return_a_receipt() {
    let reviewer = profile("rae@corp.example", Role::Reviewer);
    let mut harness = TestHarness::new(vec![reviewer.clone()]);
    harness.reviews.resulting_status =
        Some(canvassing_backend::domain::ticket::TicketStatus::ForApproval);
    let app = test_app(harness).await;
    let cookie = login_as(&app, &reviewer).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/tickets/{}/review", Uuid::new_v4()))
            .cookie(cookie)
            .set_json(json!({ "decision": "approve" }))
            .to_request(),
    )
    .await;
    assert_eq!(body["ticketStatus"], "FOR APPROVAL");
    assert_eq!(body["approval"]["status"], "APPROVED");
}

#[actix_web::test]
async fn comments_round_trip_and_delete() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;
    let ticket_id = Uuid::new_v4();

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/tickets/{ticket_id}/comments"))
            .cookie(cookie.clone())
            .set_json(json!({ "body": "any update on this?" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let posted: Value = test::read_body_json(response).await;
    assert_eq!(posted["body"], "any update on this?");
    assert_eq!(posted["authorId"], purchaser.id.to_string());

    let comment_id = posted["id"].as_str().expect("comment id");
    let response = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/comments/{comment_id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn the_dashboard_reports_the_aggregates() {
    let manager = profile("max@corp.example", Role::Manager);
    let app = test_app(TestHarness::new(vec![manager.clone()])).await;
    let cookie = login_as(&app, &manager).await;

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/dashboard")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(body["awaitingMyAction"], 2);
    assert_eq!(body["unreadNotifications"], 1);
}

#[actix_web::test]
async fn logout_clears_the_session() {
    let purchaser = profile("pat@corp.example", Role::Purchaser);
    let app = test_app(TestHarness::new(vec![purchaser.clone()])).await;
    let cookie = login_as(&app, &purchaser).await;

    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/logout")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
