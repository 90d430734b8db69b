// src/services/visit_service.rs

use serde::Serialize;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::VisitRepository,
    forms::{
        rules::{parse_outcome, parse_stage},
        selected_company_id, ContactChoices, FieldDescriptor, FormData, FormSet, NewVisitForm,
        ProductInterestedForm, SubmissionErrors, UpdateProductInterestedForm, UpdateVisitForm,
        PRODUCTS_PREFIX,
    },
    models::visit::{ContractOutcome, Customer, MeetingStage, Visit, VisitDetail},
};

/// Formulário de atualização pronto para o cliente desenhar.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormDescription {
    pub visit: VisitDetail,
    pub stage: Option<MeetingStage>,
    pub contract_outcome: Option<ContractOutcome>,
    pub fields: Vec<FieldDescriptor>,
    pub product_fields: Vec<FieldDescriptor>,
}

/// Estágio que rege as regras: sem parâmetro vale o gravado;
/// parâmetro com texto desconhecido desliga as regras.
pub fn resolve_stage(raw: Option<&str>, stored: MeetingStage) -> Option<MeetingStage> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => parse_stage(Some(text)),
        None => Some(stored),
    }
}

#[derive(Clone)]
pub struct VisitService {
    repo: VisitRepository,
}

impl VisitService {
    pub fn new(repo: VisitRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  DIRETÓRIOS
    // =========================================================================

    pub async fn list_companies<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_customers(executor).await
    }

    /// Sem empresa não há consulta: lista vazia com "Select company first".
    pub async fn contact_choices<'e, E>(
        &self,
        executor: E,
        company_id: Option<Uuid>,
    ) -> Result<ContactChoices, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(company_id) = company_id else {
            return Ok(ContactChoices::for_company(None, &[]));
        };
        let contacts = self.repo.list_contacts_by_customer(executor, company_id).await?;
        Ok(ContactChoices::for_company(Some(company_id), &contacts))
    }

    // =========================================================================
    //  CRIAÇÃO (visita + produtos de interesse)
    // =========================================================================

    pub async fn create_visit<'e, E>(&self, executor: E, data: &FormData) -> Result<VisitDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Diretórios que alimentam os selects
        let companies = self.repo.list_customers(&mut *tx).await?;
        let contacts = self.contact_choices(&mut *tx, selected_company_id(data, None)).await?;
        let products = self.repo.list_products(&mut *tx).await?;

        // 2. Valida visita e linhas juntas; os erros voltam todos de uma vez
        let visit_form = NewVisitForm::new(&companies, contacts);
        let product_formset = FormSet::new(PRODUCTS_PREFIX, ProductInterestedForm::new(&products), &[]);

        let (input, rows) = SubmissionErrors::combine(visit_form.clean(data), product_formset.clean(data))
            .map_err(|errors| {
                tracing::warn!("Nova visita rejeitada. Campos: {:?}", errors.field_names());
                AppError::FormInvalid(errors)
            })?;

        // 3. Salva
        let visit = self.repo.create_visit(&mut *tx, &input).await?;
        for row in &rows.rows {
            self.repo
                .add_product_interest(&mut *tx, visit.id, row.value.product_id, None, None, None)
                .await?;
        }

        let detail = self.load_detail(&mut *tx, visit).await?;
        tx.commit().await?;

        tracing::info!(
            "📍 Visita {} criada com {} produto(s) de interesse.",
            detail.visit.id,
            detail.products.len()
        );
        Ok(detail)
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn get_visit<'e, E>(&self, executor: E, id: Uuid) -> Result<VisitDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let visit = self.find_visit(&mut *conn, id).await?;
        self.load_detail(&mut *conn, visit).await
    }

    /// `stage` e `contract_outcome` vêm de fora do formulário (query string).
    pub async fn describe_update_form<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stage: Option<&str>,
        contract_outcome: Option<&str>,
    ) -> Result<UpdateFormDescription, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let visit = self.find_visit(&mut *conn, id).await?;

        let stage = resolve_stage(stage, visit.meeting_stage);
        let outcome = parse_outcome(contract_outcome).or(visit.contract_outcome);

        let companies = self.repo.list_customers(&mut *conn).await?;
        let contacts = self.contact_choices(&mut *conn, Some(visit.company_id)).await?;
        let products = self.repo.list_products(&mut *conn).await?;

        let fields = UpdateVisitForm::new(&visit, stage, &companies, contacts).describe();
        let product_fields = UpdateProductInterestedForm::new(&products, stage, outcome).describe();

        let visit = self.load_detail(&mut *conn, visit).await?;
        Ok(UpdateFormDescription {
            visit,
            stage,
            contract_outcome: outcome,
            fields,
            product_fields,
        })
    }

    // =========================================================================
    //  ATUALIZAÇÃO POR ESTÁGIO
    // =========================================================================

    pub async fn update_visit<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stage: Option<&str>,
        data: &FormData,
    ) -> Result<VisitDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // 1. Registro atual e suas linhas
        let visit = self.find_visit(&mut *tx, id).await?;
        let stage = resolve_stage(stage, visit.meeting_stage);
        let existing = self.repo.list_product_interests(&mut *tx, id).await?;
        let existing_ids: Vec<Uuid> = existing.iter().map(|row| row.id).collect();

        // 2. Diretórios
        let companies = self.repo.list_customers(&mut *tx).await?;
        let contacts = self
            .contact_choices(&mut *tx, selected_company_id(data, Some(&visit)))
            .await?;
        let products = self.repo.list_products(&mut *tx).await?;

        // 3. Valida. A visita olha o resultado gravado; as linhas, o desta requisição.
        let visit_form = UpdateVisitForm::new(&visit, stage, &companies, contacts);
        let outcome = visit_form.effective_outcome(data);
        let product_formset = FormSet::new(
            PRODUCTS_PREFIX,
            UpdateProductInterestedForm::new(&products, stage, outcome),
            &existing_ids,
        );

        let (input, rows) = SubmissionErrors::combine(visit_form.clean(data), product_formset.clean(data))
            .map_err(|errors| {
                tracing::warn!(
                    "Atualização da visita {} rejeitada (estágio {:?}). Campos: {:?}",
                    id,
                    stage,
                    errors.field_names()
                );
                AppError::FormInvalid(errors)
            })?;

        // 4. Grava visita, linhas alteradas, novas e removidas
        let updated = self.repo.update_visit(&mut *tx, id, &input).await?;

        for row in &rows.rows {
            let value = &row.value;
            match row.id {
                Some(row_id) => {
                    let stored = existing
                        .iter()
                        .find(|stored| stored.id == row_id)
                        .ok_or_else(|| AppError::NotFound(format!("Product interest {row_id}")))?;
                    let value = value.clone().keeping_stored(stored);
                    self.repo.update_product_interest(&mut *tx, id, row_id, &value).await?;
                }
                None => {
                    self.repo
                        .add_product_interest(
                            &mut *tx,
                            id,
                            value.product_id,
                            value.order_estimate,
                            value.final_order_amount,
                            value.payment_collected,
                        )
                        .await?;
                }
            }
        }

        if !rows.deleted.is_empty() {
            let removed = self.repo.delete_product_interests(&mut *tx, id, &rows.deleted).await?;
            tracing::info!("🗑️ {} linha(s) de produto removida(s) da visita {}.", removed, id);
        }

        let detail = self.load_detail(&mut *tx, updated).await?;
        tx.commit().await?;

        tracing::info!("✅ Visita {} atualizada (estágio {}).", id, detail.visit.meeting_stage);
        Ok(detail)
    }

    // --- auxiliares (rodam na mesma conexão/transação) ---

    async fn find_visit(&self, conn: &mut PgConnection, id: Uuid) -> Result<Visit, AppError> {
        self.repo
            .find_visit(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit {id}")))
    }

    async fn load_detail(&self, conn: &mut PgConnection, visit: Visit) -> Result<VisitDetail, AppError> {
        let (company_name, contact_name) = self
            .repo
            .find_visit_labels(&mut *conn, visit.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit {}", visit.id)))?;
        let products = self.repo.list_product_interests(&mut *conn, visit.id).await?;

        Ok(VisitDetail {
            visit,
            company_name,
            contact_name,
            products,
        })
    }
}
