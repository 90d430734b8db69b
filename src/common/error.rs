// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::forms::{FormErrors, SubmissionErrors};

#[derive(Debug, Error)]
pub enum AppError {
    // Submissão de formulário com erros (visita e/ou linhas de produto)
    #[error("Formulário inválido")]
    FormInvalid(SubmissionErrors),

    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Qualquer outro erro inesperado (com contexto do anyhow)
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<FormErrors> for AppError {
    fn from(errors: FormErrors) -> Self {
        AppError::FormInvalid(SubmissionErrors { form: errors, ..Default::default() })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::FormInvalid(errors) => {
                let report = errors.to_report();
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": report.details,
                    "nonFieldErrors": report.non_field_errors,
                    "products": report.products,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFound(ref what) => {
                tracing::debug!("Recurso não encontrado: {}", what);
                (StatusCode::NOT_FOUND, "Resource not found.")
            }

            // DatabaseError e InternalServerError viram 500; o detalhe só vai pro log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
