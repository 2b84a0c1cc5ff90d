use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthSettings, AuthUser};
use crate::database::StoreProvider;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::ProjectService;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub stores: Arc<dyn StoreProvider>,
    pub auth: Arc<AuthSettings>,
    /// None disables CORS; an empty list allows any origin
    pub cors_origins: Option<Vec<String>>,
}

impl AppState {
    pub fn new(stores: Arc<dyn StoreProvider>, auth: AuthSettings) -> Self {
        Self {
            stores,
            auth: Arc::new(auth),
            cors_origins: None,
        }
    }

    pub fn with_cors(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Service bound to a store acting as `user`
    pub fn project_service(&self, user: &AuthUser) -> ProjectService {
        ProjectService::new(self.stores.store_for(user))
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .merge(project_routes(state.clone()))
        .merge(config_routes(state.clone()))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let cors = cors_layer(state.cors_origins.as_deref());
    match cors {
        Some(cors) => router.layer(cors).with_state(state),
        None => router.with_state(state),
    }
}

fn project_routes(state: AppState) -> Router<AppState> {
    use protected::projects;

    Router::new()
        .route("/projects", post(projects::create))
        .route("/projects/", post(projects::create))
        .route("/projects/:project_id", get(projects::get).delete(projects::delete))
        .route(
            "/projects/:project_id/sources",
            post(projects::sources_post).get(projects::sources_get),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn config_routes(state: AppState) -> Router<AppState> {
    use protected::configs;

    Router::new()
        .route("/projects/configs/", post(configs::create))
        .route(
            "/projects/configs/by-project/:project_id",
            get(configs::get_by_project).delete(configs::delete_by_project),
        )
        .route(
            "/projects/configs/:config_id/fields",
            post(configs::fields_post).delete(configs::fields_delete),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: Option<&[String]>) -> Option<CorsLayer> {
    let origins = origins?;
    if origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(CorsLayer::permissive().allow_origin(allowed))
}
