use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use configuration::Config;
use database::{ClinicRepository, Registrar};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repo: ClinicRepository,
    pub registrar: Registrar,
}

/// The main function to configure and run the web server.
///
/// Connects the pool, applies migrations, and serves the API plus the
/// static frontend until the process is stopped.
pub async fn run_server(addr: SocketAddr, config: &Config) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let db_pool = database::connect(&config.database).await?;
    database::run_migrations(&db_pool).await?;

    let app_state = Arc::new(AppState {
        repo: ClinicRepository::new(db_pool.clone()),
        registrar: Registrar::new(db_pool),
    });

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let app = Router::new()
        .route("/api", get(handlers::api_index))
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/doctors",
            get(handlers::get_doctors).post(handlers::create_doctor),
        )
        .route(
            "/api/doctors/:id",
            get(handlers::get_doctor)
                .put(handlers::update_doctor)
                .delete(handlers::delete_doctor),
        )
        .route(
            "/api/patients",
            get(handlers::get_patients).post(handlers::create_patient),
        )
        .route("/api/appointments/today", get(handlers::get_todays_appointments))
        .route("/api/appointments", post(handlers::create_appointment))
        .route("/api/dashboard/stats", get(handlers::get_dashboard_stats))
        .route("/api/search/doctors", get(handlers::search_doctors))
        // Everything outside /api falls through to the static frontend.
        .fallback_service(
            ServeDir::new("public").not_found_service(ServeFile::new("public/index.html")),
        )
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024)); // 1MB is plenty for CRUD bodies

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
