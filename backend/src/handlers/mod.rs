use actix_web::{web, HttpRequest, HttpResponse};
use shared::ApiError;

use crate::models::{AppState, UserRow};
use crate::services::users as user_service;

pub mod auth;
pub mod expenses;
pub mod households;
pub mod reports;
pub mod users;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(households::configure)
            .configure(expenses::configure)
            .configure(reports::configure)
            .configure(users::configure),
    );
}

pub(crate) fn error_body(error: &str, message: &str) -> ApiError {
    ApiError {
        error: error.to_string(),
        message: message.to_string(),
    }
}

/// Resolve the Bearer token to a full user row. Handlers turn the Err
/// variant straight into the response.
pub(crate) async fn current_user(
    state: &AppState,
    req: &HttpRequest,
) -> Result<UserRow, HttpResponse> {
    let user_id = match crate::middleware::auth::extract_user_id(req, &state.config.jwt_secret) {
        Ok(id) => id,
        Err(_) => {
            return Err(HttpResponse::Unauthorized()
                .json(error_body("unauthorized", "Invalid or missing token")));
        }
    };

    match user_service::get_user_row(&state.db, &user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            Err(HttpResponse::Unauthorized().json(error_body("unauthorized", "Unknown user")))
        }
        Err(e) => {
            log::error!("Error loading current user: {:?}", e);
            Err(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to load user")))
        }
    }
}
