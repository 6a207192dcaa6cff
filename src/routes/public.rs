use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::{self, CurrentSession},
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/login", post(login_submit))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    logged_in: bool,
    username: String,
    show_error: bool,
    error_message: String,
}

async fn landing(current: CurrentSession) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LandingTemplate {
        logged_in: current.is_active(),
        username: current
            .0
            .map(|user| user.username)
            .unwrap_or_default(),
        show_error: false,
        error_message: String::new(),
    })
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match auth::authenticate_user(&state, &form.username, &form.password).await {
        Ok(user) => {
            let session_id = auth::create_session(&state, user.id).await?;
            info!(user = %user.username, "signed in");
            Ok((
                auth::apply_session_cookie(jar, &session_id),
                Redirect::to("/admin/rides"),
            )
                .into_response())
        }
        Err(AppError::Unauthorized) => Ok(render_login_error(
            form.username,
            "Usuario o contraseña incorrectos".into(),
        )),
        Err(AppError::BadRequest(msg)) => Ok(render_login_error(form.username, msg)),
        Err(err) => Err(err),
    }
}

fn render_login_error(username: String, message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        AskamaTemplateResponse::into_response(LandingTemplate {
            logged_in: false,
            username,
            show_error: true,
            error_message: message,
        }),
    )
        .into_response()
}
