use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use actix_web_httpauth::extractors::basic::BasicAuth;

use crate::{
    api::state::AppState,
    model::{
        apperror::{ApplicationError, ErrorType},
        config::AdminCredentials,
    },
};

const UNAUTHORIZED_MESSAGE: &str = "관리자 인증이 필요합니다.";

/**
 * Basic auth guard for the admin endpoints.
 */
#[derive(Clone)]
pub struct BasicAuthService {
    /**
     * Expected credentials. `None` leaves the admin endpoints open.
     */
    admin_credentials: Option<AdminCredentials>,
}

impl BasicAuthService {
    /**
     * Creates a new instance of `BasicAuthService`.
     *
     * # Arguments
     * `admin_credentials`: Expected credentials, or `None` to disable the check.
     */
    pub fn new(admin_credentials: Option<AdminCredentials>) -> Self {
        BasicAuthService { admin_credentials }
    }

    /**
     * Validates the basic auth credentials of the HTTP request.
     *
     * # Arguments
     * `http_request`: The HTTP request containing the credentials in the Authorization header.
     *
     * # Returns
     * A Result indicating success or an `Unauthorized` error.
     */
    pub fn validate(&self, http_request: &HttpRequest) -> Result<(), ApplicationError> {
        let Some(expected) = &self.admin_credentials else {
            return Ok(());
        };
        let credentials = BasicAuth::from_request(http_request, &mut actix_web::dev::Payload::None).into_inner().ok();
        let Some(credentials) = credentials else {
            tracing::debug!("Admin request without credentials");
            return Err(ApplicationError::new(ErrorType::Unauthorized, UNAUTHORIZED_MESSAGE));
        };
        if credentials.user_id() != expected.username || credentials.password() != Some(expected.password.as_str()) {
            tracing::warn!("Admin request with invalid credentials for user {}", credentials.user_id());
            return Err(ApplicationError::new(ErrorType::Unauthorized, UNAUTHORIZED_MESSAGE));
        }
        Ok(())
    }
}

/**
 * Extractor granting access to an admin endpoint. Listed first in a handler's arguments so the
 * credentials are checked before the path or body is parsed.
 */
pub struct AdminAccess;

impl FromRequest for AdminAccess {
    type Error = ApplicationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(http_request: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match http_request.app_data::<web::Data<AppState>>() {
            Some(app_state) => app_state.security_service.validate(http_request).map(|()| AdminAccess),
            None => {
                tracing::error!("Application state missing, refusing admin request");
                Err(ApplicationError::new(ErrorType::Initialization, UNAUTHORIZED_MESSAGE))
            }
        };
        ready(result)
    }
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;
    use base64::{Engine, engine::general_purpose::STANDARD};

    use super::*;

    fn admin_service() -> BasicAuthService {
        BasicAuthService::new(Some(AdminCredentials { username: "admin".to_string(), password: "secret".to_string() }))
    }

    fn basic_header(username: &str, password: &str) -> (&'static str, String) {
        ("Authorization", format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))))
    }

    #[test]
    fn test_validate_success() {
        let req = TestRequest::default().insert_header(basic_header("admin", "secret")).to_http_request();
        assert!(admin_service().validate(&req).is_ok());
    }

    #[test]
    fn test_validate_missing_credentials() {
        let req = TestRequest::default().to_http_request();
        let err = admin_service().validate(&req).unwrap_err();
        assert_eq!(err.error_type, ErrorType::Unauthorized);
    }

    #[test]
    fn test_validate_wrong_password() {
        let req = TestRequest::default().insert_header(basic_header("admin", "wrong")).to_http_request();
        assert!(admin_service().validate(&req).is_err());
    }

    #[test]
    fn test_validate_wrong_username() {
        let req = TestRequest::default().insert_header(basic_header("root", "secret")).to_http_request();
        assert!(admin_service().validate(&req).is_err());
    }

    #[test]
    fn test_validate_bearer_token_rejected() {
        let req = TestRequest::default().insert_header(("Authorization", "Bearer token")).to_http_request();
        assert!(admin_service().validate(&req).is_err());
    }

    #[test]
    fn test_validate_without_configured_credentials() {
        let req = TestRequest::default().to_http_request();
        assert!(BasicAuthService::new(None).validate(&req).is_ok());
    }
}
