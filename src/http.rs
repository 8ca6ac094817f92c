use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde_json::json;
use tracing::error;

use crate::errors::ApprovalError;
use crate::service::ApprovalService;
use crate::types::{CustomerId, LoanId, LoanRequest, RegisterCustomerRequest};

impl ResponseError for ApprovalError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApprovalError::CustomerNotFound { .. } | ApprovalError::LoanNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ApprovalError::LoanNotApproved { .. } | ApprovalError::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApprovalError::LoanNotApproved { eligibility } => {
                HttpResponse::BadRequest().json(json!({
                    "message": "Loan not approved based on eligibility check.",
                    "details": eligibility,
                }))
            }
            ApprovalError::Database(e) => {
                error!("database error: {e}");
                HttpResponse::InternalServerError().json(json!({
                    "error": "internal server error",
                }))
            }
            _ => HttpResponse::build(self.status_code()).json(json!({
                "error": self.to_string(),
            })),
        }
    }
}

#[actix_web::get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[actix_web::post("/register")]
pub async fn register_customer(
    service: web::Data<ApprovalService>,
    request: web::Json<RegisterCustomerRequest>,
) -> Result<HttpResponse, ApprovalError> {
    let customer = service.register_customer(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(customer))
}

#[actix_web::post("/check-eligibility")]
pub async fn check_eligibility(
    service: web::Data<ApprovalService>,
    request: web::Json<LoanRequest>,
) -> Result<HttpResponse, ApprovalError> {
    let result = service.check_eligibility(&request).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[actix_web::post("/create-loan")]
pub async fn create_loan(
    service: web::Data<ApprovalService>,
    request: web::Json<LoanRequest>,
) -> Result<HttpResponse, ApprovalError> {
    let created = service.create_loan(&request).await?;
    Ok(HttpResponse::Created().json(created))
}

#[actix_web::get("/view-loan/{loan_id}")]
pub async fn view_loan(
    service: web::Data<ApprovalService>,
    path: web::Path<LoanId>,
) -> Result<HttpResponse, ApprovalError> {
    let detail = service.view_loan(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[actix_web::get("/view-loans/{customer_id}")]
pub async fn view_customer_loans(
    service: web::Data<ApprovalService>,
    path: web::Path<CustomerId>,
) -> Result<HttpResponse, ApprovalError> {
    let loans = service.view_customer_loans(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(loans))
}

/// mount every route on the given service config
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(register_customer)
        .service(check_eligibility)
        .service(create_loan)
        .service(view_loan)
        .service(view_customer_loans);
}
