//! Dashboard and quote endpoints

use crate::aggregate::{DashboardView, LandedQuote, RateBasis};
use crate::api::{ApiResponse, AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    #[serde(default)]
    basis: RateBasis,
    #[serde(default)]
    premium: Decimal,
    #[serde(default)]
    freight: Decimal,
}

async fn dashboard(State(state): State<AppState>) -> Json<ApiResponse<DashboardView>> {
    Json(ApiResponse::ok(state.prices.view()))
}

async fn quote(State(state): State<AppState>, Query(query): Query<QuoteQuery>) -> Response {
    let view = state.prices.view();
    match view.quote(query.basis, query.premium, query.freight) {
        Ok(quote) => Json(ApiResponse::<LandedQuote>::ok(quote)).into_response(),
        Err(e) => {
            tracing::debug!(premium = %query.premium, freight = %query.freight, "Quote rejected");
            (StatusCode::BAD_REQUEST, Json(ApiResponse::failure(e.to_string()))).into_response()
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/quote", get(quote))
}
