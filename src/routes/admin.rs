use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::{Query, State},
    response::{Redirect, Response},
    routing::get,
    Router,
};
use tracing::warn;

use crate::{
    auth::CurrentSession,
    dashboard::{columns, session::ENTRY_POINT},
    error::AppError,
    models::pagination::{PageQuery, Pagination},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin/rides") }))
        .route("/rides", get(rides_page))
}

#[derive(Template)]
#[template(path = "admin/rides.html")]
struct RidesTemplate {
    username: String,
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
    page_number: u32,
    page_size: u32,
    has_previous: bool,
    previous_page: u32,
    has_next: bool,
    next_page: u32,
    total_hint: String,
    has_error: bool,
    error_message: String,
}

async fn rides_page(
    State(state): State<AppState>,
    current: CurrentSession,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let Some(user) = current.0 else {
        return Ok(Redirect::to(ENTRY_POINT).into_response());
    };
    let pagination = Pagination::from_query(&query, state.config.default_page_size)?;

    let mut template = RidesTemplate {
        username: user.username,
        headers: columns::headers(),
        rows: Vec::new(),
        page_number: pagination.page_index() + 1,
        page_size: pagination.page_size(),
        has_previous: pagination.page_index() > 0,
        previous_page: pagination.previous().page_index(),
        has_next: false,
        next_page: pagination.next().page_index(),
        total_hint: String::new(),
        has_error: false,
        error_message: String::new(),
    };

    match state.rides.page(pagination).await {
        Ok(page) => {
            template.has_next = page.rides.len() >= pagination.page_size() as usize;
            template.rows = page.rides.iter().map(columns::render_row).collect();
            template.total_hint = page.total.to_string();
            Ok(AskamaTemplateResponse::into_response(template))
        }
        Err(err) => {
            warn!("rides page could not be loaded: {err}");
            let status = err.status();
            template.has_error = true;
            template.error_message = err.to_string();
            Ok((status, AskamaTemplateResponse::into_response(template)).into_response())
        }
    }
}
