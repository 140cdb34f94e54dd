use std::collections::BTreeSet;

use crate::{
    api::security::BasicAuthService,
    model::models::RegistrationField,
    service::{export::ExportService, registrations::RegistrationService},
};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * Guard for the admin endpoints.
     */
    pub security_service: BasicAuthService,
    /**
     * The registration service handling store operations.
     */
    pub registration_service: RegistrationService,
    /**
     * Labeling and spreadsheet generation for exports.
     */
    pub export_service: ExportService,
    /**
     * Fields a submission must contain.
     */
    pub required_fields: BTreeSet<RegistrationField>,
    /**
     * Environment name reported by the health endpoint.
     */
    pub environment: String,
}

/**
 * Creates a new instance of `AppState`.
 *
 * # Arguments
 * `security_service`: Guard for the admin endpoints.
 * `registration_service`: The registration service handling store operations.
 * `export_service`: Labeling and spreadsheet generation for exports.
 * `required_fields`: Fields a submission must contain.
 * `environment`: Environment name.
 */
impl AppState {
    pub fn new(security_service: BasicAuthService, registration_service: RegistrationService, export_service: ExportService, required_fields: BTreeSet<RegistrationField>, environment: String) -> Self {
        AppState { security_service, registration_service, export_service, required_fields, environment }
    }
}
