//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use visits_backend::{config::AppState, docs::ApiDoc, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await?;
    let addr = app_state.bind_addr.clone();

    let visit_routes = Router::new()
        .route("/", post(handlers::visits::create_visit))
        .route("/companies", get(handlers::visits::list_companies))
        .route("/contacts", get(handlers::visits::list_contacts))
        .route(
            "/{id}",
            get(handlers::visits::get_visit).put(handlers::visits::update_visit),
        )
        .route("/{id}/form", get(handlers::visits::describe_update_form));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/visits", visit_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
