use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Result};
use shared::Period;

use crate::handlers::{current_user, error_body};
use crate::models::AppState;
use crate::services::reports as report_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/report/{period}", web::get().to(export_report));
}

/// Export the period report as an xlsx attachment.
async fn export_report(
    state: web::Data<AppState>,
    req: actix_web::HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = match current_user(&state, &req).await {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    let period: Period = match path.into_inner().parse() {
        Ok(period) => period,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(error_body(
                "validation_error",
                "Period must be daily, monthly, yearly or full",
            )));
        }
    };

    let report_path = match report_service::generate_report(
        &state.db,
        &state.config.reports_dir,
        user.household_uuid(),
        period,
    )
    .await
    {
        Ok(path) => path,
        Err(e) => {
            log::error!("Error generating report: {:?}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(error_body("internal_error", "Failed to generate report")));
        }
    };

    let filename = report_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "report.xlsx".to_string());

    let file = NamedFile::open(&report_path)?.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    });

    Ok(file.into_response(&req))
}
