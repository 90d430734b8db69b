// src/config.rs

use crate::{db::VisitRepository, services::visit_service::VisitService};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub bind_addr: String,
    pub visit_service: VisitService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let max_connections = parse_max_connections(env::var("DB_MAX_CONNECTIONS").ok().as_deref())?;

        let db_pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let visit_repo = VisitRepository::new(db_pool.clone());
        let visit_service = VisitService::new(visit_repo);

        Ok(Self {
            db_pool,
            bind_addr,
            visit_service,
        })
    }
}

fn parse_max_connections(raw: Option<&str>) -> anyhow::Result<u32> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => {
            let parsed: u32 = value
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS inválido: {value}"))?;
            anyhow::ensure!(parsed > 0, "DB_MAX_CONNECTIONS deve ser maior que zero");
            Ok(parsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_connections_defaults_when_unset() {
        assert_eq!(parse_max_connections(None).unwrap(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(parse_max_connections(Some(" ")).unwrap(), DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn max_connections_rejects_garbage() {
        assert_eq!(parse_max_connections(Some("12")).unwrap(), 12);
        assert!(parse_max_connections(Some("many")).is_err());
        assert!(parse_max_connections(Some("0")).is_err());
    }
}
