use actix_web::{
    HttpRequest, HttpResponse, delete, get,
    http::header::ContentDisposition,
    post, put,
    web::{self, Path},
};
use chrono::Utc;
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{ApiResponse, HealthResponse, RegistrationElement, RegistrationRequest},
        security::AdminAccess,
        state::AppState,
    },
    model::{
        apperror::{ApplicationError, ErrorType},
        models::RegistrationSubmissionType,
    },
    dao::registrations::NOT_FOUND_MESSAGE,
    service::export::export_file_name,
};

const CREATED_MESSAGE: &str = "접수가 완료되었습니다.";
const UPDATED_MESSAGE: &str = "접수가 수정되었습니다.";
const DELETED_MESSAGE: &str = "접수가 삭제되었습니다.";
const INVALID_BODY_MESSAGE: &str = "요청 형식이 올바르지 않습니다.";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/**
 * Registers every endpoint of the service.
 */
pub fn configure(config: &mut web::ServiceConfig) {
    config
        .app_data(json_config())
        .app_data(path_config())
        .service(health)
        .service(catalog)
        .service(registrations_list)
        .service(registration_get)
        .service(registration_add)
        .service(registration_update)
        .service(registration_delete)
        .service(export_json)
        .service(export_excel);
}

/**
 * JSON extractor configuration. Unparseable bodies are answered with the regular error envelope.
 */
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _http_request| {
        tracing::debug!("Rejected request body: {err}");
        ApplicationError::new(ErrorType::Validation, INVALID_BODY_MESSAGE).into()
    })
}

/**
 * Path extractor configuration. An id that is not a number cannot match a registration.
 */
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _http_request| {
        tracing::debug!("Rejected path: {err}");
        ApplicationError::new(ErrorType::NotFound, NOT_FOUND_MESSAGE).into()
    })
}

/**
 * Health check reporting environment, version and database reachability.
 */
#[get("/health")]
pub async fn health(app_state: web::Data<AppState>) -> HttpResponse {
    let database = if app_state.registration_service.is_database_available().await { "ok" } else { "unavailable" };
    HttpResponse::Ok().json(HealthResponse { status: "ok".to_string(), environment: app_state.environment.clone(), version: env!("CARGO_PKG_VERSION").to_string(), database: database.to_string() })
}

/**
 * Lookup tables used by the registration form.
 */
#[get("/api/catalog")]
pub async fn catalog(app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::with_data(app_state.export_service.catalog()))
}

/**
 * Endpoint to retrieve all registrations, newest first.
 */
#[instrument(skip(_admin, http_request, app_state), fields(service = "listRegistrations", trace_id = get_trace_id(&http_request)))]
#[get("/api/registrations")]
pub async fn registrations_list(_admin: AdminAccess, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registrations = app_state.registration_service.get_registrations().instrument(span).await?;
    let elements: Vec<RegistrationElement> = registrations.into_iter().map(RegistrationElement::from).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::with_data(elements)))
}

/**
 * Endpoint to retrieve a single registration.
 */
#[instrument(skip(_admin, http_request, app_state), fields(service = "getRegistration", trace_id = get_trace_id(&http_request)))]
#[get("/api/registrations/{registrationId}")]
pub async fn registration_get(_admin: AdminAccess, path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registration = app_state.registration_service.get_registration(path.into_inner()).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_data(RegistrationElement::from(registration))))
}

/**
 * Endpoint to submit a new registration. Open to everyone.
 */
#[instrument(skip(http_request, request_body, app_state), fields(service = "addRegistration", trace_id = get_trace_id(&http_request)))]
#[post("/api/registrations")]
pub async fn registration_add(http_request: HttpRequest, request_body: web::Json<RegistrationRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registration_input = RegistrationSubmissionType::from(request_body).validate(&app_state.required_fields)?;
    let registration_id = app_state.registration_service.add_registration(registration_input).instrument(span).await?;
    tracing::info!("Registration {} created", registration_id);
    Ok(HttpResponse::Created().json(ApiResponse::created(CREATED_MESSAGE, registration_id)))
}

/**
 * Endpoint to overwrite a registration.
 */
#[instrument(skip(_admin, http_request, request_body, app_state), fields(service = "updateRegistration", trace_id = get_trace_id(&http_request)))]
#[put("/api/registrations/{registrationId}")]
pub async fn registration_update(_admin: AdminAccess, path: Path<i64>, http_request: HttpRequest, request_body: web::Json<RegistrationRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registration_id = path.into_inner();
    let registration_input = RegistrationSubmissionType::from(request_body).validate(&app_state.required_fields)?;
    app_state.registration_service.update_registration(registration_id, registration_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(UPDATED_MESSAGE)))
}

/**
 * Endpoint to delete a registration.
 */
#[instrument(skip(_admin, http_request, app_state), fields(service = "deleteRegistration", trace_id = get_trace_id(&http_request)))]
#[delete("/api/registrations/{registrationId}")]
pub async fn registration_delete(_admin: AdminAccess, path: Path<i64>, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registration_id = path.into_inner();
    app_state.registration_service.delete_registration(registration_id).instrument(span).await?;
    tracing::info!("Registration {} deleted", registration_id);
    Ok(HttpResponse::Ok().json(ApiResponse::with_message(DELETED_MESSAGE)))
}

/**
 * Endpoint to export all registrations as labeled JSON.
 */
#[instrument(skip(_admin, http_request, app_state), fields(service = "exportJson", trace_id = get_trace_id(&http_request)))]
#[get("/api/export")]
pub async fn export_json(_admin: AdminAccess, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registrations = app_state.registration_service.get_registrations().instrument(span).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::with_data(app_state.export_service.label(&registrations))))
}

/**
 * Endpoint to download all registrations as a spreadsheet. A copy is kept in the export directory.
 */
#[instrument(skip(_admin, http_request, app_state), fields(service = "exportExcel", trace_id = get_trace_id(&http_request)))]
#[get("/export-excel")]
pub async fn export_excel(_admin: AdminAccess, http_request: HttpRequest, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let registrations = app_state.registration_service.get_registrations().instrument(span.clone()).await?;
    let created_at = Utc::now();
    let contents = app_state.export_service.build_workbook(&app_state.export_service.label(&registrations))?;
    let path = app_state.export_service.write_export_file(&contents, created_at).instrument(span).await?;
    let file_name = path.file_name().map_or_else(|| export_file_name(created_at), |name| name.to_string_lossy().into_owned());
    Ok(HttpResponse::Ok().content_type(XLSX_CONTENT_TYPE).insert_header(ContentDisposition::attachment(file_name)).body(contents))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID").and_then(|v| v.to_str().ok().map(std::string::ToString::to_string)).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
