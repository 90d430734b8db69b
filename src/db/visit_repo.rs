// src/db/visit_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    forms::{NewVisitInput, ProductInterestUpdate, VisitUpdateInput},
    models::visit::{Customer, CustomerContact, Product, ProductInterested, Visit},
};

const VISIT_COLUMNS: &str = r#"
    id, company_id, contact_id, contact_number, designation,
    latitude, longitude, item_discussed, meeting_stage, status, tag,
    client_budget, is_order_final, contract_outcome, contract_amount,
    reason_lost, is_payment_collected, created_at, updated_at
"#;

#[derive(Clone)]
pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  DIRETÓRIOS (Empresas, Contatos, Produtos)
    // =========================================================================

    pub async fn list_customers<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, company_name FROM customers ORDER BY company_name ASC",
        )
        .fetch_all(executor)
        .await?;

        Ok(customers)
    }

    /// Contatos de UMA empresa, em ordem alfabética
    pub async fn list_contacts_by_customer<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerContact>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let contacts = sqlx::query_as::<_, CustomerContact>(
            r#"
            SELECT id, customer_id, contact_name, contact_number, designation
            FROM customer_contacts
            WHERE customer_id = $1
            ORDER BY contact_name ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

        Ok(contacts)
    }

    pub async fn list_products<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>("SELECT id, name FROM products ORDER BY name ASC")
            .fetch_all(executor)
            .await?;

        Ok(products)
    }

    // =========================================================================
    //  VISITAS
    // =========================================================================

    pub async fn find_visit<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {VISIT_COLUMNS} FROM visits WHERE id = $1");
        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(visit)
    }

    /// (nome da empresa, nome do contato) para exibição
    pub async fn find_visit_labels<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<(String, String)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let labels = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT c.company_name, cc.contact_name
            FROM visits v
            JOIN customers c ON c.id = v.company_id
            JOIN customer_contacts cc ON cc.id = v.contact_id
            WHERE v.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(labels)
    }

    /// Cria a visita no estágio inicial ("New")
    pub async fn create_visit<'e, E>(&self, executor: E, input: &NewVisitInput) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO visits (
                company_id, contact_id, contact_number, designation,
                latitude, longitude, item_discussed, meeting_stage
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'New')
            RETURNING {VISIT_COLUMNS}
            "#
        );

        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(input.company_id)
            .bind(input.contact_id)
            .bind(input.contact_number.as_deref())
            .bind(input.designation.as_deref())
            .bind(input.latitude.as_decimal())
            .bind(input.longitude.as_decimal())
            .bind(input.item_discussed.as_deref())
            .fetch_one(executor)
            .await?;

        Ok(visit)
    }

    pub async fn update_visit<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &VisitUpdateInput,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Coordenadas ausentes na submissão mantêm o valor gravado
        let sql = format!(
            r#"
            UPDATE visits SET
                company_id = $2,
                contact_id = $3,
                contact_number = $4,
                designation = $5,
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                item_discussed = $8,
                meeting_stage = $9,
                status = $10,
                tag = $11,
                client_budget = $12,
                is_order_final = $13,
                contract_outcome = $14,
                contract_amount = $15,
                reason_lost = $16,
                is_payment_collected = $17,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {VISIT_COLUMNS}
            "#
        );

        let visit = sqlx::query_as::<_, Visit>(&sql)
            .bind(id)
            .bind(input.company_id)
            .bind(input.contact_id)
            .bind(input.contact_number.as_deref())
            .bind(input.designation.as_deref())
            .bind(input.latitude.map(|c| c.as_decimal()))
            .bind(input.longitude.map(|c| c.as_decimal()))
            .bind(input.item_discussed.as_deref())
            .bind(input.meeting_stage)
            .bind(input.status.as_deref())
            .bind(input.tag.as_deref())
            .bind(input.client_budget)
            .bind(input.is_order_final)
            .bind(input.contract_outcome)
            .bind(input.contract_amount)
            .bind(input.reason_lost.as_deref())
            .bind(input.is_payment_collected)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit {id}")))?;

        Ok(visit)
    }

    // =========================================================================
    //  PRODUTOS DE INTERESSE (linhas da visita)
    // =========================================================================

    pub async fn list_product_interests<'e, E>(
        &self,
        executor: E,
        visit_id: Uuid,
    ) -> Result<Vec<ProductInterested>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ProductInterested>(
            r#"
            SELECT id, visit_id, product_id, order_estimate, final_order_amount, payment_collected
            FROM product_interested
            WHERE visit_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(visit_id)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    pub async fn add_product_interest<'e, E>(
        &self,
        executor: E,
        visit_id: Uuid,
        product_id: Uuid,
        order_estimate: Option<Decimal>,
        final_order_amount: Option<Decimal>,
        payment_collected: Option<Decimal>,
    ) -> Result<ProductInterested, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ProductInterested>(
            r#"
            INSERT INTO product_interested (
                visit_id, product_id, order_estimate, final_order_amount, payment_collected
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, visit_id, product_id, order_estimate, final_order_amount, payment_collected
            "#,
        )
        .bind(visit_id)
        .bind(product_id)
        .bind(order_estimate)
        .bind(final_order_amount)
        .bind(payment_collected)
        .fetch_one(executor)
        .await?;

        Ok(row)
    }

    pub async fn update_product_interest<'e, E>(
        &self,
        executor: E,
        visit_id: Uuid,
        id: Uuid,
        input: &ProductInterestUpdate,
    ) -> Result<ProductInterested, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, ProductInterested>(
            r#"
            UPDATE product_interested SET
                product_id = $3,
                order_estimate = $4,
                final_order_amount = $5,
                payment_collected = $6
            WHERE id = $1 AND visit_id = $2
            RETURNING id, visit_id, product_id, order_estimate, final_order_amount, payment_collected
            "#,
        )
        .bind(id)
        .bind(visit_id)
        .bind(input.product_id)
        .bind(input.order_estimate)
        .bind(input.final_order_amount)
        .bind(input.payment_collected)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product interest {id}")))?;

        Ok(row)
    }

    /// Remove as linhas marcadas com DELETE. Só apaga linhas da própria visita.
    pub async fn delete_product_interests<'e, E>(
        &self,
        executor: E,
        visit_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM product_interested WHERE visit_id = $1 AND id = ANY($2)")
            .bind(visit_id)
            .bind(ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
