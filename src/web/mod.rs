use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod admin;
mod assets;
pub mod auth;
pub mod booking;
pub mod csrf;
mod error;
pub mod flash;
mod observability;
pub mod recovery;
pub mod templates;

pub use error::WebError;

use crate::services::{AuthService, BookingService, RecoveryService};
use metrics_exporter_prometheus::PrometheusHandle;
use templates::Templates;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub templates: Arc<Templates>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn booking_service(&self) -> &Arc<dyn BookingService> {
        &self.shared.booking_service
    }

    #[must_use]
    pub fn recovery_service(&self) -> &Arc<dyn RecoveryService> {
        &self.shared.recovery_service
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let templates = Arc::new(Templates::load()?);

    Ok(Arc::new(AppState {
        shared,
        templates,
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle)
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_expiry_minutes,
        )));

    let member_routes = Router::new()
        .route("/", get(booking::index))
        .route("/booking/", post(booking::book))
        .route(
            "/question/",
            get(recovery::question_page).post(recovery::save_answer),
        )
        .route("/logout/", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_login,
        ));

    let staff_routes = Router::new()
        .route("/admin/", get(admin::dashboard))
        .route("/admin/appointments/", post(admin::create_appointment))
        .route(
            "/admin/appointments/{id}/delete/",
            post(admin::delete_appointment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let mut app = Router::new()
        .merge(member_routes)
        .merge(staff_routes)
        .route("/appointments/", get(booking::roster))
        .route(
            "/forgot/",
            get(recovery::forgot_page).post(recovery::forgot),
        )
        .route(
            "/changepswd/",
            get(recovery::changepswd_page).post(recovery::changepswd),
        )
        .route("/login/", get(auth::login_page).post(auth::login))
        .route("/static/{*path}", get(assets::serve_static));

    if state.config().observability.metrics_enabled {
        app = app.route("/metrics", get(observability::get_metrics));
    }

    app.layer(session_layer)
        .with_state(state)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}
