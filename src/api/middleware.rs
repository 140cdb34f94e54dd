use actix_web::{
    Error,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use tracing::info;

/**
 * Logs every request with its status and processing time.
 */
pub async fn request_logging_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = std::time::Instant::now();
    let path = request.path().to_owned();
    let method = request.method().to_owned();
    let response = next.call(request).await;
    let response_code = match &response {
        Ok(service_response) => service_response.status().as_u16(),
        Err(err) => err.as_response_error().status_code().as_u16(),
    };
    info!(target: "requests", "{} {} {} {}ms", method, path, response_code, start_time.elapsed().as_millis());
    response
}

#[cfg(test)]
mod test {
    use actix_web::{App, HttpResponse, http::StatusCode, middleware::from_fn, test, test::TestRequest, web};

    use super::*;

    #[actix_web::test]
    async fn test_logging_passes_response_through() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(request_logging_middleware))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().body("ok") }))
                .route("/api/registrations/{registrationId}", web::delete().to(HttpResponse::NotFound)),
        )
        .await;
        let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "ok");
        let resp = test::call_service(&app, TestRequest::delete().uri("/api/registrations/1").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = test::call_service(&app, TestRequest::get().uri("/unknown").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
