use actix_cors::Cors;
use actix_web::http::header;

/**
 * Cross-origin policy for the registration form. No configured origins allows any origin.
 *
 * # Arguments
 * `allowed_origins`: Origins allowed to call the API from a browser.
 */
pub fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600);
    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }
    allowed_origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
}
