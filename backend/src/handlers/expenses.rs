use actix_web::{web, HttpResponse, Result};
use shared::{ApiSuccess, CreateExpenseRequest, CreateExpenseResponse, ExpenseRangeQuery};

use crate::handlers::{current_user, error_body};
use crate::models::AppState;
use crate::services::expenses as expense_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/expense", web::post().to(add_expense))
        .route("/expenses", web::get().to(list_expenses));
}

async fn add_expense(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    body: web::Json<CreateExpenseRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match expense_service::record_expense(&state.db, &user, &body.into_inner()).await {
        Ok(expense_id) => Ok(HttpResponse::Created()
            .json(ApiSuccess::new(CreateExpenseResponse { expense_id }))),
        Err(expense_service::ExpenseError::InvalidInput(message)) => {
            Ok(HttpResponse::BadRequest().json(error_body("validation_error", &message)))
        }
        Err(expense_service::ExpenseError::NoHousehold) => Ok(HttpResponse::BadRequest()
            .json(error_body("no_household", "User is not in a household"))),
        Err(e) => {
            log::error!("Error recording expense: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to record expense")))
        }
    }
}

async fn list_expenses(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    query: web::Query<ExpenseRangeQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let range = query.into_inner();
    match expense_service::list_expenses(&state.db, user.household_uuid(), range.start, range.end)
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(list)),
        Err(e) => {
            log::error!("Error listing expenses: {:?}", e);
            Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to list expenses")))
        }
    }
}
