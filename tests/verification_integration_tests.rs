use account_verify_api::application::verification_service::VALIDATE_PHONE_PROCEDURE;
use account_verify_api::data::memory::{
    InMemoryProcedureGateway, InMemoryVerificationProvider, ProviderReply,
};
use account_verify_api::domain::models::{ProcedureResult, SqlValue};
use account_verify_api::domain::verification::VerificationStatus;
use account_verify_api::presentation::handlers::{AppState, json_config};
use account_verify_api::presentation::verification::{check_otp, send_otp};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::json;
use std::sync::Arc;

macro_rules! setup_test {
    () => {{
        let gateway = InMemoryProcedureGateway::new();
        let provider = InMemoryVerificationProvider::new();
        let state = web::Data::new(AppState::new(
            Arc::new(gateway.clone()),
            Arc::new(provider.clone()),
            true,
        ));

        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .app_data(json_config())
                .service(
                    web::scope("/verify")
                        .route("/send-otp", web::post().to(send_otp))
                        .route("/check-otp", web::post().to(check_otp)),
                ),
        )
        .await;

        (app, gateway, provider)
    }};
}

fn check_request() -> serde_json::Value {
    json!({ "phoneNumber": "+15551234567", "otp": "123456" })
}

#[actix_web::test]
async fn test_send_otp_returns_verification_sid() {
    let (app, _gateway, provider) = setup_test!();

    let req = test::TestRequest::post()
        .uri("/verify/send-otp")
        .set_json(json!({ "phoneNumber": "+15551234567", "channel": "call" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "OTP sent successfully.");
    assert!(body["verificationSid"].as_str().unwrap().starts_with("VE"));

    let requests = provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].phone_number, "+15551234567");
    assert_eq!(requests[0].value, "call");
}

#[actix_web::test]
async fn test_send_otp_requires_phone_number() {
    let (app, _gateway, provider) = setup_test!();

    let req = test::TestRequest::post()
        .uri("/verify/send-otp")
        .set_json(json!({ "phoneNumber": "", "channel": "sms" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Phone number is required.");
    assert!(provider.requests().await.is_empty());
}

#[actix_web::test]
async fn test_send_otp_provider_rejection_surfaces_detail() {
    let (app, _gateway, provider) = setup_test!();
    provider
        .reply_to_start(ProviderReply::Rejected {
            status: 400,
            message: "Invalid parameter `To`: 12".to_string(),
        })
        .await;

    let req = test::TestRequest::post()
        .uri("/verify/send-otp")
        .set_json(json!({ "phoneNumber": "12", "channel": "sms" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "An error occurred while sending OTP through the verification provider."
    );
    assert!(
        body["details"]
            .as_str()
            .unwrap()
            .contains("Invalid parameter `To`")
    );
}

#[actix_web::test]
async fn test_send_otp_unexpected_failure() {
    let (app, _gateway, provider) = setup_test!();
    provider
        .reply_to_start(ProviderReply::Unreachable("connection reset".to_string()))
        .await;

    let req = test::TestRequest::post()
        .uri("/verify/send-otp")
        .set_json(json!({ "phoneNumber": "+15551234567", "channel": "sms" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "An unexpected error occurred while sending OTP."
    );
    assert_eq!(body["details"], "connection reset");
}

#[actix_web::test]
async fn test_check_otp_approved_and_recorded() {
    let (app, gateway, provider) = setup_test!();
    gateway
        .script(
            VALIDATE_PHONE_PROCEDURE,
            ProcedureResult::Scalar(Some(SqlValue::Int(1))),
        )
        .await;

    let req = test::TestRequest::post()
        .uri("/verify/check-otp")
        .set_json(check_request())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["response"], "success");
    assert_eq!(body["status"], "approved");
    assert!(body.get("affectedRows").is_none());

    let requests = provider.requests().await;
    assert_eq!(requests[0].operation, "check");
    assert_eq!(requests[0].value, "123456");
    assert_eq!(gateway.calls().await.len(), 1);
}

#[actix_web::test]
async fn test_check_otp_approved_but_not_recorded() {
    let (app, gateway, _provider) = setup_test!();

    for (scripted, expected_affected) in [
        (ProcedureResult::Scalar(Some(SqlValue::Int(0))), json!(0)),
        (ProcedureResult::Scalar(None), serde_json::Value::Null),
        (ProcedureResult::Rows(Vec::new()), serde_json::Value::Null),
    ] {
        gateway.script(VALIDATE_PHONE_PROCEDURE, scripted).await;

        let req = test::TestRequest::post()
            .uri("/verify/check-otp")
            .set_json(check_request())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["response"], "fail");
        assert_eq!(body["status"], "approved");
        assert_eq!(body["affectedRows"], expected_affected);
    }
}

#[actix_web::test]
async fn test_check_otp_not_approved_echoes_status() {
    let (app, gateway, provider) = setup_test!();

    for status in [
        VerificationStatus::Pending,
        VerificationStatus::Expired,
        VerificationStatus::Other("Approved".to_string()),
    ] {
        provider
            .reply_to_check(ProviderReply::Status(status.clone()))
            .await;

        let req = test::TestRequest::post()
            .uri("/verify/check-otp")
            .set_json(check_request())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["response"], "fail");
        assert_eq!(body["status"], status.as_str());
        assert!(body["verificationSid"].is_string());
    }

    assert!(gateway.calls().await.is_empty());
}

#[actix_web::test]
async fn test_check_otp_requires_phone_and_code() {
    let (app, _gateway, provider) = setup_test!();

    for body in [
        json!({ "phoneNumber": "+15551234567", "otp": " " }),
        json!({ "otp": "123456" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/verify/check-otp")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Phone number and OTP are required.");
    }
    assert!(provider.requests().await.is_empty());
}

#[actix_web::test]
async fn test_check_otp_provider_and_database_failures() {
    let (app, gateway, provider) = setup_test!();

    provider
        .reply_to_check(ProviderReply::Rejected {
            status: 404,
            message: "The requested resource was not found".to_string(),
        })
        .await;
    let req = test::TestRequest::post()
        .uri("/verify/check-otp")
        .set_json(check_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["response"], "fail");
    assert_eq!(
        body["message"],
        "An error occurred while verifying OTP through the verification provider."
    );

    provider
        .reply_to_check(ProviderReply::Status(VerificationStatus::Approved))
        .await;
    gateway
        .fail(VALIDATE_PHONE_PROCEDURE, "permission denied for function")
        .await;
    let req = test::TestRequest::post()
        .uri("/verify/check-otp")
        .set_json(check_request())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["details"], "permission denied for function");
}
