use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{RegistrationDetailType, RegistrationSubmissionType},
};

/***************** Envelope *********************/

/**
 * Envelope wrapping every JSON response.
 */
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /**
     * Whether the request succeeded.
     */
    pub success: bool,
    /**
     * Localized message for the user.
     */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /**
     * Payload.
     */
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /**
     * Id of a newly created registration.
     */
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn with_data(data: T) -> Self {
        ApiResponse { success: true, message: None, data: Some(data), id: None }
    }
}

impl ApiResponse<()> {
    pub fn with_message(message: &str) -> Self {
        ApiResponse { success: true, message: Some(message.to_string()), data: None, id: None }
    }

    pub fn created(message: &str, id: i64) -> Self {
        ApiResponse { success: true, message: Some(message.to_string()), data: None, id: Some(id) }
    }

    pub fn failure(message: &str) -> Self {
        ApiResponse { success: false, message: Some(message.to_string()), data: None, id: None }
    }
}

/***************** Registration models *********************/

/**
 * Registration as posted by the form. Fields may be missing, validation decides which are required.
 */
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub birthdate: Option<String>,
    pub living_type: Option<String>,
    pub program: Option<String>,
    /**
     * Accepts `true`/`false` as well as `1`/`0` and their string forms.
     */
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub privacy_agreement: Option<bool>,
}

impl From<web::Json<RegistrationRequest>> for RegistrationSubmissionType {
    fn from(request: web::Json<RegistrationRequest>) -> Self {
        let request = request.into_inner();
        RegistrationSubmissionType {
            name: request.name,
            gender: request.gender,
            address: request.address,
            phone: request.phone,
            birthdate: request.birthdate,
            living_type: request.living_type,
            program: request.program,
            privacy_agreement: request.privacy_agreement,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag: Option<Flag> = Option::deserialize(deserializer)?;
    Ok(flag.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Number(value) => value != 0,
        Flag::Text(value) => matches!(value.trim(), "1" | "true" | "on" | "yes"),
    }))
}

/**
 * A stored registration on the wire.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationElement {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub address: String,
    pub phone: String,
    pub birthdate: String,
    pub living_type: String,
    pub program: String,
    pub privacy_agreement: bool,
    pub registration_date: DateTime<Utc>,
}

impl From<RegistrationDetailType> for RegistrationElement {
    fn from(registration: RegistrationDetailType) -> Self {
        RegistrationElement {
            id: registration.id,
            name: registration.name,
            gender: registration.gender,
            address: registration.address,
            phone: registration.phone,
            birthdate: registration.birthdate,
            living_type: registration.living_type,
            program: registration.program,
            privacy_agreement: registration.privacy_agreement,
            registration_date: registration.registration_date,
        }
    }
}

/***************** Health models *********************/

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub version: String,
    pub database: String,
}

/***************** Error models *********************/

impl ResponseError for ApplicationError {
    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }

    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if self.error_type == ErrorType::Unauthorized {
            response.insert_header((header::WWW_AUTHENTICATE, "Basic realm=\"admin\""));
        }
        response.json(ApiResponse::failure(&self.message))
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `error_type`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(error_type: &ErrorType) -> StatusCode {
    match error_type {
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorType::NotFound => StatusCode::NOT_FOUND,
        ErrorType::Initialization | ErrorType::Database | ErrorType::Export => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Connection => StatusCode::BAD_GATEWAY,
    }
}
