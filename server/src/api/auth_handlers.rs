use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};

use crate::{
    auth::{AuthError, NewUser},
    entity::app_user,
};

use super::{
    ApiErr, AppState,
    dto::{AuthResponse, CurrentUserResponse, LoginRequest, RegistrationRequest},
    session::{self, AuthClaims, Session},
};
use sea_orm::EntityTrait;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiErr> {
    match state.auth.authenticate(&body.user_name, &body.password).await {
        Ok(user) => {
            let cookie = session::login_cookie(&state, &user).map_err(ApiErr::internal)?;
            tracing::info!(username = %user.username, "user logged in");
            Ok((
                [(header::SET_COOKIE, cookie)],
                Json(AuthResponse::authenticated(body.user_name)),
            )
                .into_response())
        }
        Err(e) if e.is_rejection() => {
            tracing::info!(username = %body.user_name, reason = %e, "login rejected");
            Ok(Json(AuthResponse::rejected(body.user_name)).into_response())
        }
        Err(e) => Err(ApiErr::internal(e)),
    }
}

pub async fn logout(Session(session): Session) -> Response {
    if let Some(claims) = session {
        tracing::info!(username = %claims.username, "user logged out");
    }
    (
        [(header::SET_COOKIE, session::logout_cookie())],
        Json(AuthResponse::logged_out()),
    )
        .into_response()
}

pub async fn registration(
    State(state): State<AppState>,
    Json(body): Json<RegistrationRequest>,
) -> Result<Response, ApiErr> {
    let new_user = NewUser {
        username: &body.user_name,
        password: &body.password,
        first_name: &body.first_name,
        last_name: &body.last_name,
        email: &body.email,
    };

    match state.auth.register(new_user).await {
        Ok(user) => {
            let cookie = session::login_cookie(&state, &user).map_err(ApiErr::internal)?;
            tracing::info!(username = %user.username, "user registered");
            Ok((
                [(header::SET_COOKIE, cookie)],
                Json(AuthResponse::authenticated(body.user_name)),
            )
                .into_response())
        }
        Err(AuthError::AlreadyExists) => {
            Ok(Json(AuthResponse::already_registered(body.user_name)).into_response())
        }
        Err(e) => Err(ApiErr::internal(e)),
    }
}

pub async fn me(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
) -> Result<Json<CurrentUserResponse>, ApiErr> {
    let user = app_user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found("User not found"))?;

    Ok(Json(CurrentUserResponse::from(user)))
}
