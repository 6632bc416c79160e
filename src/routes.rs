use actix_files::{Files, NamedFile};
use actix_web::{http::Method, web, HttpRequest, HttpResponse, Responder};
use log::info;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest};
use crate::resolver::{resolve_login, resolve_registration};
use crate::state::AppState;

const INDEX_PAGE: &str = "index.html";
const REGISTER_PAGE: &str = "register.html";
const ADMIN_PAGE: &str = "admin.html";

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let json = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());

    cfg.app_data(json)
        .route("/reg", web::get().to(register_page))
        .route("/admin", web::get().to(admin_page))
        .route("/deployment.json", web::get().to(deployment))
        .route("/contract", web::get().to(contract_artifact))
        .route("/api/register", web::post().to(register))
        .route("/api/login", web::post().to(login))
        .service(Files::new("/contracts", &config.contracts_dir))
        .default_service(web::to(fallback));
}

async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    info!(
        "Received registration request: {} {}",
        request.voter_id, request.constituency
    );

    let resolved = resolve_registration(&state, &request.voter_id, request.constituency).await?;
    Ok(HttpResponse::Ok().json(resolved))
}

async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    info!("Received login request: {}", request.voter_id);

    let resolved = resolve_login(&state, &request.voter_id).await?;
    Ok(HttpResponse::Ok().json(resolved))
}

async fn deployment(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(&state.deployment)
}

async fn contract_artifact(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async(&state.config.contract_artifact).await?)
}

async fn page(state: &AppState, name: &str) -> actix_web::Result<NamedFile> {
    Ok(NamedFile::open_async(state.config.static_dir.join(name)).await?)
}

async fn register_page(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    page(&state, REGISTER_PAGE).await
}

async fn admin_page(state: web::Data<AppState>) -> actix_web::Result<NamedFile> {
    page(&state, ADMIN_PAGE).await
}

// Any other GET lands on the voter page.
async fn fallback(req: HttpRequest, state: web::Data<AppState>) -> actix_web::Result<HttpResponse> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(HttpResponse::NotFound().finish());
    }

    let file = page(&state, INDEX_PAGE).await?;
    Ok(file.into_response(&req))
}
