use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all trellis endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::permissive().max_age(state.max_age());

    // Preflights for resolutions are cacheable as long as the resolutions.
    let resolve = Router::new()
        .route("/api/resolve", get(handler::resolve_handler))
        .layer(cors.clone())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            preflight_cache_control(&state),
        ));

    Router::new()
        .route("/api/", get(handler::health_handler))
        .route("/api/info", get(handler::info_handler))
        .route("/api/search-blob", get(handler::search_blob_handler))
        .layer(cors)
        .merge(resolve)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `Cache-Control` for responses the CORS layer answered as a preflight.
fn preflight_cache_control(state: &AppState) -> impl Fn(&Response) -> Option<HeaderValue> + Clone {
    let value = HeaderValue::from_str(state.cache_control()).ok();
    move |response: &Response| {
        if response.headers().contains_key(header::ACCESS_CONTROL_MAX_AGE) {
            value.clone()
        } else {
            None
        }
    }
}
