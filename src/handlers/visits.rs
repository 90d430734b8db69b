// src/handlers/visits.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    forms::{errors::SubmissionErrorReport, ContactChoices, FormData},
    models::visit::{Customer, VisitDetail},
    services::visit_service::UpdateFormDescription,
};

// =============================================================================
//  ÁREA 1: DIRETÓRIOS (selects dependentes)
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ContactsQuery {
    /// Empresa selecionada. Ausente ou inválida = lista vazia.
    pub company_id: Option<String>,
}

// GET /api/visits/companies
#[utoipa::path(
    get,
    path = "/api/visits/companies",
    tag = "Visits",
    responses(
        (status = 200, description = "Empresas em ordem alfabética", body = Vec<Customer>)
    )
)]
pub async fn list_companies(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let companies = app_state.visit_service.list_companies(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(companies)))
}

// GET /api/visits/contacts?companyId=
#[utoipa::path(
    get,
    path = "/api/visits/contacts",
    tag = "Visits",
    params(ContactsQuery),
    responses(
        (status = 200, description = "Contatos da empresa + placeholder do select", body = ContactChoices)
    )
)]
pub async fn list_contacts(
    State(app_state): State<AppState>,
    Query(query): Query<ContactsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let company_id = query
        .company_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    let choices = app_state
        .visit_service
        .contact_choices(&app_state.db_pool, company_id)
        .await?;

    Ok((StatusCode::OK, Json(choices)))
}

// =============================================================================
//  ÁREA 2: VISITAS
// =============================================================================

// POST /api/visits
#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "Visits",
    request_body(
        content = FormData,
        description = "Campos da visita + form set `products` (products-TOTAL_FORMS, products-0-product_interested, ...)"
    ),
    responses(
        (status = 201, description = "Visita criada", body = VisitDetail),
        (status = 400, description = "Formulário inválido", body = SubmissionErrorReport)
    )
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    Json(data): Json<FormData>,
) -> Result<impl IntoResponse, AppError> {
    let visit = app_state
        .visit_service
        .create_visit(&app_state.db_pool, &data)
        .await?;

    Ok((StatusCode::CREATED, Json(visit)))
}

// GET /api/visits/{id}
#[utoipa::path(
    get,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(
        ("id" = Uuid, Path, description = "ID da visita")
    ),
    responses(
        (status = 200, description = "Visita com os produtos de interesse", body = VisitDetail),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn get_visit(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let visit = app_state.visit_service.get_visit(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(visit)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UpdateFormQuery {
    /// Estágio que rege as regras. Ausente = estágio gravado.
    #[param(example = "Closing")]
    pub stage: Option<String>,
    /// Resultado usado pelas linhas de produto. Ausente = resultado gravado.
    #[param(example = "Won")]
    pub contract_outcome: Option<String>,
}

// GET /api/visits/{id}/form?stage=&contractOutcome=
#[utoipa::path(
    get,
    path = "/api/visits/{id}/form",
    tag = "Visits",
    params(
        ("id" = Uuid, Path, description = "ID da visita"),
        UpdateFormQuery
    ),
    responses(
        (status = 200, description = "Campos do formulário de atualização", body = UpdateFormDescription),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn describe_update_form(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UpdateFormQuery>,
) -> Result<impl IntoResponse, AppError> {
    let form = app_state
        .visit_service
        .describe_update_form(
            &app_state.db_pool,
            id,
            query.stage.as_deref(),
            query.contract_outcome.as_deref(),
        )
        .await?;

    Ok((StatusCode::OK, Json(form)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UpdateVisitQuery {
    #[param(example = "Payment Followup")]
    pub stage: Option<String>,
}

// PUT /api/visits/{id}?stage=
#[utoipa::path(
    put,
    path = "/api/visits/{id}",
    tag = "Visits",
    params(
        ("id" = Uuid, Path, description = "ID da visita"),
        UpdateVisitQuery
    ),
    request_body(
        content = FormData,
        description = "Campos da visita + form set `products` com linhas existentes (products-<i>-id) e DELETE"
    ),
    responses(
        (status = 200, description = "Visita atualizada", body = VisitDetail),
        (status = 400, description = "Formulário inválido", body = SubmissionErrorReport),
        (status = 404, description = "Visita não encontrada")
    )
)]
pub async fn update_visit(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UpdateVisitQuery>,
    Json(data): Json<FormData>,
) -> Result<impl IntoResponse, AppError> {
    let visit = app_state
        .visit_service
        .update_visit(&app_state.db_pool, id, query.stage.as_deref(), &data)
        .await?;

    Ok((StatusCode::OK, Json(visit)))
}
