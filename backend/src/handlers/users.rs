use actix_web::{web, HttpResponse, Result};
use shared::ApiSuccess;
use uuid::Uuid;

use crate::handlers::{current_user, error_body};
use crate::models::{AppState, UserRow};
use crate::services::users as user_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/{id}", web::delete().to(deactivate_user))
            .route("/{from}/transfer/{to}", web::post().to(transfer_expenses))
            .route("/{id}/make_admin", web::post().to(make_admin)),
    );
}

async fn require_admin(
    state: &AppState,
    req: &actix_web::HttpRequest,
) -> Result<UserRow, HttpResponse> {
    let user = current_user(state, req).await?;
    if !user.is_admin {
        return Err(
            HttpResponse::Forbidden().json(error_body("forbidden", "Admin access required"))
        );
    }
    Ok(user)
}

fn parse_id(id: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(id).map_err(|_| {
        HttpResponse::BadRequest().json(error_body("invalid_id", "Invalid user ID format"))
    })
}

/// Soft-delete a household member (admin only).
async fn deactivate_user(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let admin = match require_admin(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let target_id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match user_service::deactivate_user(&state.db, &admin, &target_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new("user deactivated"))),
        Err(user_service::UserAdminError::NotFound) => {
            Ok(HttpResponse::NotFound().json(error_body("not_found", "User not found")))
        }
        Err(user_service::UserAdminError::CannotDeleteSelf) => Ok(HttpResponse::BadRequest()
            .json(error_body("invalid_target", "Cannot delete yourself"))),
        Err(e) => {
            log::error!("Error deactivating user: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to deactivate user")))
        }
    }
}

/// Move a member's expense history to another member before deactivating
/// them (admin only).
async fn transfer_expenses(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let admin = match require_admin(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let (from_str, to_str) = path.into_inner();
    let (from_id, to_id) = match (parse_id(&from_str), parse_id(&to_str)) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(resp), _) | (_, Err(resp)) => return Ok(resp),
    };

    match user_service::transfer_and_deactivate(&state.db, &admin, &from_id, &to_id).await {
        Ok(()) => Ok(HttpResponse::Ok()
            .json(ApiSuccess::new("expenses transferred and user deactivated"))),
        Err(user_service::UserAdminError::InvalidUsers) => {
            Ok(HttpResponse::BadRequest().json(error_body("invalid_users", "Invalid users")))
        }
        Err(e) => {
            log::error!("Error transferring expenses: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to transfer expenses")))
        }
    }
}

async fn make_admin(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let admin = match require_admin(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let target_id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match user_service::make_admin(&state.db, &admin, &target_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new("user is now an admin"))),
        Err(user_service::UserAdminError::NotFound) => {
            Ok(HttpResponse::NotFound().json(error_body("not_found", "User not found")))
        }
        Err(e) => {
            log::error!("Error promoting user: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to promote user")))
        }
    }
}
