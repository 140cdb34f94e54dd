use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{RegistrationDetailType, RegistrationInputType},
};

/**
 * Database response type for querying registrations.
 */
pub type QueryRegistrationDbResp = (i64, String, String, String, String, String, String, String, bool, DateTime<Utc>);

/**
 * SQL query to retrieve all registrations, newest first.
 */
const QUERY_REGISTRATION_LIST: &str = "SELECT id, name, gender, address, phone, birthdate, living_type, program, privacy_agreement, registration_date
                                       FROM registrations
                                       ORDER BY registration_date DESC, id DESC";

/**
 * SQL query to retrieve a single registration.
 */
const QUERY_REGISTRATION: &str = "SELECT id, name, gender, address, phone, birthdate, living_type, program, privacy_agreement, registration_date FROM registrations WHERE id = ?";

/**
 * SQL query to add a new registration.
 */
const ADD_REGISTRATION: &str = "INSERT INTO registrations (name, gender, address, phone, birthdate, living_type, program, privacy_agreement, registration_date) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";

/**
 * SQL query to overwrite a registration. The registration date is never changed.
 */
const UPDATE_REGISTRATION: &str = "UPDATE registrations SET name = ?, gender = ?, address = ?, phone = ?, birthdate = ?, living_type = ?, program = ?, privacy_agreement = ? WHERE id = ?";

/**
 * SQL query to delete a registration.
 */
const DELETE_REGISTRATION: &str = "DELETE FROM registrations WHERE id = ?";

pub const LOAD_FAILED_MESSAGE: &str = "데이터를 불러오는데 실패했습니다.";
pub const CREATE_FAILED_MESSAGE: &str = "접수 생성에 실패했습니다.";
pub const UPDATE_FAILED_MESSAGE: &str = "접수 수정에 실패했습니다.";
pub const DELETE_FAILED_MESSAGE: &str = "접수 삭제에 실패했습니다.";
pub const NOT_FOUND_MESSAGE: &str = "해당 접수를 찾을 수 없습니다.";

/**
 * DAO for registration database operations.
 */
pub struct RegistrationDao {}

impl RegistrationDao {
    /**
     * Creates a new instance of `RegistrationDao`.
     */
    pub fn new() -> Self {
        RegistrationDao {}
    }

    /**
     * Retrieves every registration ordered by registration date, newest first.
     *
     * # Arguments
     * `connection`: The database connection.
     *
     * # Returns
     * A Result containing the registrations or an `ApplicationError`.
     */
    #[instrument(skip(self, connection))]
    pub async fn get_registration_list(&self, connection: &mut SqliteConnection) -> Result<Vec<RegistrationDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryRegistrationDbResp> = sqlx::query_as(QUERY_REGISTRATION_LIST)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, LOAD_FAILED_MESSAGE))?;
        Ok(results.into_iter().map(RegistrationDetailType::from).collect())
    }

    /**
     * Retrieves a single registration.
     *
     * # Arguments
     * `connection`: The database connection.
     * `registration_id`: Id of the registration.
     *
     * # Returns
     * The registration, or a `NotFound` error if no row matches.
     */
    #[instrument(skip(self, connection))]
    pub async fn get_registration(&self, connection: &mut SqliteConnection, registration_id: i64) -> Result<RegistrationDetailType, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryRegistrationDbResp> = sqlx::query_as(QUERY_REGISTRATION)
            .bind(registration_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, LOAD_FAILED_MESSAGE))?;
        match result {
            Some(row) => Ok(RegistrationDetailType::from(row)),
            None => {
                tracing::debug!("Registration with id {} not found", registration_id);
                Err(ApplicationError::new(ErrorType::NotFound, NOT_FOUND_MESSAGE))
            }
        }
    }

    /**
     * Adds a new registration.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `registration_input`: Validated registration fields.
     * `registration_date`: Timestamp stored as the registration date.
     *
     * # Returns
     * The id assigned to the new registration.
     */
    #[instrument(skip(self, transaction, registration_input))]
    pub async fn add_registration(&self, transaction: &mut SqliteConnection, registration_input: RegistrationInputType, registration_date: DateTime<Utc>) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(ADD_REGISTRATION)
            .bind(registration_input.name)
            .bind(registration_input.gender)
            .bind(registration_input.address)
            .bind(registration_input.phone)
            .bind(registration_input.birthdate)
            .bind(registration_input.living_type)
            .bind(registration_input.program)
            .bind(registration_input.privacy_agreement)
            .bind(registration_date)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, CREATE_FAILED_MESSAGE))?;
        Ok(result.last_insert_rowid())
    }

    /**
     * Overwrites all mutable fields of a registration.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `registration_id`: Id of the registration.
     * `registration_input`: Replacement fields.
     *
     * # Returns
     * A result indicating success, or `NotFound` if no row was changed.
     */
    #[instrument(skip(self, transaction, registration_input))]
    pub async fn update_registration(&self, transaction: &mut SqliteConnection, registration_id: i64, registration_input: RegistrationInputType) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(UPDATE_REGISTRATION)
            .bind(registration_input.name)
            .bind(registration_input.gender)
            .bind(registration_input.address)
            .bind(registration_input.phone)
            .bind(registration_input.birthdate)
            .bind(registration_input.living_type)
            .bind(registration_input.program)
            .bind(registration_input.privacy_agreement)
            .bind(registration_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, UPDATE_FAILED_MESSAGE))?;
        Self::check_single_row(result.rows_affected(), registration_id, "updated")
    }

    /**
     * Deletes a registration.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `registration_id`: Id of the registration.
     *
     * # Returns
     * A result indicating success, or `NotFound` if nothing was removed.
     */
    #[instrument(skip(self, transaction))]
    pub async fn delete_registration(&self, transaction: &mut SqliteConnection, registration_id: i64) -> Result<(), ApplicationError> {
        let span = tracing::Span::current();
        let result = sqlx::query(DELETE_REGISTRATION)
            .bind(registration_id)
            .execute(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(&err, DELETE_FAILED_MESSAGE))?;
        Self::check_single_row(result.rows_affected(), registration_id, "deleted")
    }

    /**
     * Maps the affected row count of an update or delete to a result.
     */
    fn check_single_row(rows_affected: u64, registration_id: i64, action: &str) -> Result<(), ApplicationError> {
        match rows_affected {
            0 => {
                tracing::debug!("Registration with id {} not found, nothing {}", registration_id, action);
                Err(ApplicationError::new(ErrorType::NotFound, NOT_FOUND_MESSAGE))
            }
            1 => Ok(()),
            _ => {
                tracing::warn!("Multiple registrations attempted {}. Rolled back", action);
                Err(ApplicationError::new(ErrorType::Database, format!("Multiple registrations attempted {action}. Rolled back")))
            }
        }
    }

    /**
     * Logs the database error and maps it to a generic application error.
     *
     * # Arguments
     * `error`: The database error.
     * `message`: Message returned to the caller.
     */
    fn handle_database_error(error: &sqlx::Error, message: &str) -> ApplicationError {
        match error.as_database_error() {
            Some(db_error) => tracing::error!("Database error {:?}: {}", db_error.code(), db_error),
            None => tracing::error!("Failed to execute database operation: {}", error),
        }
        ApplicationError::new(ErrorType::Database, message)
    }
}

impl From<QueryRegistrationDbResp> for RegistrationDetailType {
    fn from(row: QueryRegistrationDbResp) -> Self {
        let (id, name, gender, address, phone, birthdate, living_type, program, privacy_agreement, registration_date) = row;
        RegistrationDetailType { id, name, gender, address, phone, birthdate, living_type, program, privacy_agreement, registration_date }
    }
}
