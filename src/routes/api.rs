use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::{debug, info};

use crate::{
    auth::{self, CurrentSession},
    error::AppError,
    models::{
        pagination::{PageQuery, Pagination},
        ride::RidePage,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rides", get(list_rides))
        .route("/auth/sign-out", post(sign_out))
}

/// `GET /api/rides?page=&pageSize=`; `total` in the response is an
/// estimate.
pub async fn list_rides(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<PageQuery>,
) -> Result<Json<RidePage>, AppError> {
    let user = current.require()?;
    let pagination = Pagination::from_query(&query, state.config.default_page_size)?;
    let page = state.rides.page(pagination).await?;
    debug!(
        user = %user.username,
        page = pagination.page_index(),
        returned = page.rides.len(),
        "served rides page"
    );
    Ok(Json(page))
}

pub async fn sign_out(
    State(state): State<AppState>,
    current: CurrentSession,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    if let Some(user) = current.0 {
        auth::destroy_session(&state, &user.session_id).await?;
        info!(user = %user.username, "signed out");
    }
    Ok((auth::clear_session_cookie(jar), Redirect::to("/")))
}
