use actix_web::{web, HttpResponse, Result};
use shared::{ApiSuccess, JoinHouseholdRequest, MemberList, SetBudgetRequest};

use crate::handlers::{current_user, error_body};
use crate::models::AppState;
use crate::services::budget as budget_service;
use crate::services::households as household_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/household")
            .route("", web::get().to(get_household))
            .route("/join", web::post().to(join_household)),
    )
    .route("/members", web::get().to(list_members))
    .route("/budget", web::get().to(get_budget))
    .route("/budget", web::post().to(set_budget));
}

/// Household summary for the caller, invite code included.
async fn get_household(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let Some(household_id) = user.household_uuid() else {
        return Ok(HttpResponse::BadRequest()
            .json(error_body("no_household", "User is not in a household")));
    };

    match household_service::get_household(&state.db, &household_id).await {
        Ok(Some(household)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(household))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(error_body("not_found", "Household not found"))),
        Err(e) => {
            log::error!("Error fetching household: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to fetch household")))
        }
    }
}

async fn join_household(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<JoinHouseholdRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let request = body.into_inner();
    let Some(user_id) = user.uuid() else {
        log::error!("Unparseable id on authenticated user row");
        return Ok(HttpResponse::InternalServerError()
            .json(error_body("internal_error", "Failed to join household")));
    };

    match household_service::join_household(&state.db, &user_id, &request.invite_code).await {
        Ok(household) => Ok(HttpResponse::Ok().json(ApiSuccess::new(household))),
        Err(household_service::HouseholdError::InvalidInviteCode) => Ok(HttpResponse::NotFound()
            .json(error_body("invalid_invite", "Invalid invite code"))),
        Err(e) => {
            log::error!("Error joining household: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to join household")))
        }
    }
}

async fn list_members(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let Some(household_id) = user.household_uuid() else {
        return Ok(HttpResponse::BadRequest()
            .json(error_body("no_household", "User is not in a household")));
    };

    match household_service::list_active_members(&state.db, &household_id).await {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiSuccess::new(MemberList { members }))),
        Err(e) => {
            log::error!("Error listing members: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to list members")))
        }
    }
}

/// All-time spend against the current budget. A caller without a household
/// gets all zeros rather than an error.
async fn get_budget(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match budget_service::budget_summary(&state.db, user.household_uuid(), None, None).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(summary)),
        Err(e) => {
            log::error!("Error computing budget summary: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to compute budget")))
        }
    }
}

async fn set_budget(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<SetBudgetRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if !user.is_admin {
        return Ok(HttpResponse::Forbidden()
            .json(error_body("forbidden", "Admin access required")));
    }

    let Some(household_id) = user.household_uuid() else {
        return Ok(HttpResponse::BadRequest()
            .json(error_body("no_household", "User is not in a household")));
    };

    let request = body.into_inner();
    if request.amount < 0.0 {
        return Ok(HttpResponse::BadRequest()
            .json(error_body("validation_error", "Budget must not be negative")));
    }

    match household_service::set_budget(&state.db, &household_id, request.amount).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiSuccess::new(request))),
        Err(household_service::HouseholdError::NotFound) => Ok(HttpResponse::NotFound()
            .json(error_body("not_found", "Household not found"))),
        Err(e) => {
            log::error!("Error setting budget: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to set budget")))
        }
    }
}
