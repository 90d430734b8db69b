//! Formato JSON devolvido pelo `AppError`.

use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use serde_json::Value;
use validator::Validate;

use visits_backend::common::error::AppError;
use visits_backend::forms::{FormError, FormErrors, FormSetErrors, SubmissionErrors};

async fn body_json(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, serde_json::from_slice(&bytes).expect("body should be JSON"))
}

#[tokio::test]
async fn invalid_submission_lists_fields_rows_and_non_field_errors() {
    let mut form = FormErrors::new();
    form.add("contract_outcome", FormError::Required);
    form.add_non_field(FormError::InvalidCoordinate);

    let mut products = FormSetErrors::new();
    let mut row = FormErrors::new();
    row.add("payment_collected", FormError::Required);
    products.add_row(2, row);

    let (status, body) = body_json(AppError::FormInvalid(SubmissionErrors { form, products })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["contract_outcome"][0], "This field is required.");
    assert_eq!(
        body["nonFieldErrors"][0],
        "Invalid coordinates received. Please refresh and try again."
    );
    assert_eq!(
        body["products"]["rows"]["2"]["details"]["payment_collected"][0],
        "This field is required."
    );
}

#[tokio::test]
async fn too_many_rows_is_a_form_set_error() {
    let mut products = FormSetErrors::new();
    products.add_non_form(FormError::TooManyForms(1000));

    let (status, body) = body_json(AppError::FormInvalid(SubmissionErrors {
        form: FormErrors::new(),
        products,
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["products"]["nonFormErrors"][0], "Please submit at most 1000 forms.");
}

#[tokio::test]
async fn not_found_and_internal_errors_use_generic_messages() {
    let (status, body) = body_json(AppError::NotFound("Visit 42".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found.");

    let (status, body) = body_json(AppError::from(anyhow::anyhow!("pool exploded"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An unexpected error occurred.");
}

#[derive(Validate)]
struct LostReason {
    #[validate(length(max = 10, message = "Ensure this value has at most 10 characters."))]
    reason_lost: String,
}

#[tokio::test]
async fn validator_failures_are_reported_as_field_errors() {
    let failure = LostReason { reason_lost: "Went with a cheaper vendor".into() }
        .validate()
        .unwrap_err();

    let (status, body) = body_json(AppError::from(FormErrors::from(failure))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "One or more fields are invalid.");
    assert_eq!(
        body["details"]["reason_lost"][0],
        "Ensure this value has at most 10 characters."
    );
    assert_eq!(body["nonFieldErrors"], serde_json::json!([]));
}
