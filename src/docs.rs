// src/docs.rs

use utoipa::OpenApi;
use crate::forms;
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Diretórios ---
        handlers::visits::list_companies,
        handlers::visits::list_contacts,

        // --- Visitas ---
        handlers::visits::create_visit,
        handlers::visits::get_visit,
        handlers::visits::describe_update_form,
        handlers::visits::update_visit,
    ),
    components(
        schemas(
            // --- Visitas ---
            models::visit::MeetingStage,
            models::visit::ContractOutcome,
            models::visit::Customer,
            models::visit::CustomerContact,
            models::visit::Product,
            models::visit::Visit,
            models::visit::ProductInterested,
            models::visit::VisitDetail,

            // --- Formulários ---
            forms::FormData,
            forms::FieldDescriptor,
            forms::Widget,
            forms::Choice,
            forms::ContactChoices,
            forms::errors::FormErrorReport,
            forms::errors::FormSetErrorReport,
            forms::errors::SubmissionErrorReport,
            services::visit_service::UpdateFormDescription,
        )
    ),
    tags(
        (name = "Visits", description = "Registro de visitas de vendas e produtos de interesse")
    )
)]
pub struct ApiDoc;
