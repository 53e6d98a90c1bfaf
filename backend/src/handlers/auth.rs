use actix_web::{web, HttpResponse, Result};
use shared::{ApiSuccess, AuthResponse, LoginRequest, RegisterRequest};

use crate::handlers::{current_user, error_body};
use crate::models::AppState;
use crate::services::auth as auth_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(get_current_user)),
    );
}

async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    if request.email.trim().is_empty() || request.password.is_empty() {
        return Ok(HttpResponse::BadRequest()
            .json(error_body("validation_error", "Email and password are required")));
    }

    if request.password.len() < 8 {
        return Ok(HttpResponse::BadRequest().json(error_body(
            "validation_error",
            "Password must be at least 8 characters",
        )));
    }

    match auth_service::register_user(&state.db, &request).await {
        Ok(user) => {
            match auth_service::create_jwt(
                &user.id,
                &state.config.jwt_secret,
                state.config.jwt_expiration_hours,
            ) {
                Ok(token) => {
                    Ok(HttpResponse::Created().json(ApiSuccess::new(AuthResponse { token, user })))
                }
                Err(e) => {
                    log::error!("JWT creation error: {:?}", e);
                    Ok(HttpResponse::InternalServerError()
                        .json(error_body("jwt_error", "Failed to create token")))
                }
            }
        }
        Err(auth_service::AuthError::EmailTaken) => Ok(HttpResponse::BadRequest()
            .json(error_body("email_taken", "Email already registered"))),
        Err(auth_service::AuthError::InvalidInviteCode) => Ok(HttpResponse::NotFound()
            .json(error_body("invalid_invite", "Invalid invite code"))),
        Err(e) => {
            log::error!("Registration error: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to register user")))
        }
    }
}

async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let request = body.into_inner();
    let rate_key = request.email.trim().to_lowercase();

    if !state.login_rate_limiter.check(&rate_key) {
        return Ok(HttpResponse::TooManyRequests().json(error_body(
            "rate_limited",
            "Too many login attempts, try again later",
        )));
    }

    match auth_service::login_user(&state.db, &request).await {
        Ok(user) => {
            state.login_rate_limiter.clear(&rate_key);
            match auth_service::create_jwt(
                &user.id,
                &state.config.jwt_secret,
                state.config.jwt_expiration_hours,
            ) {
                Ok(token) => {
                    Ok(HttpResponse::Ok().json(ApiSuccess::new(AuthResponse { token, user })))
                }
                Err(e) => {
                    log::error!("JWT creation error: {:?}", e);
                    Ok(HttpResponse::InternalServerError()
                        .json(error_body("jwt_error", "Failed to create token")))
                }
            }
        }
        Err(auth_service::AuthError::InvalidCredentials) => {
            state.login_rate_limiter.record(&rate_key);
            Ok(HttpResponse::Unauthorized()
                .json(error_body("authentication_error", "Invalid email or password")))
        }
        Err(e) => {
            log::error!("Login error: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to log in")))
        }
    }
}

async fn get_current_user(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match user.to_shared() {
        Some(user) => Ok(HttpResponse::Ok().json(ApiSuccess::new(user))),
        None => {
            log::error!("Unparseable id on authenticated user row");
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to load user")))
        }
    }
}
