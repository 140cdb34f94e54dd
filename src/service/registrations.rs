use chrono::Utc;
use sqlx::{Pool, Sqlite, Transaction};

use crate::{
    dao::registrations::RegistrationDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{RegistrationDetailType, RegistrationInputType},
    },
};

/**
 * Represents the service for managing registrations.
 */
pub struct RegistrationService {
    /**
     * The DAO for registration operations.
     */
    registration_dao: RegistrationDao,
    /**
     * Connection pool for database operations.
     */
    connection_pool: Pool<Sqlite>,
}

impl RegistrationService {
    /**
     * Creates a new instance of `RegistrationService`.
     *
     * # Arguments
     * `registration_dao`: The DAO for registration operations.
     * `connection_pool`: Connection pool for database operations.
     */
    pub fn new(registration_dao: RegistrationDao, connection_pool: Pool<Sqlite>) -> Self {
        RegistrationService { registration_dao, connection_pool }
    }

    /**
     * Retrieves all registrations, newest first.
     */
    pub async fn get_registrations(&self) -> Result<Vec<RegistrationDetailType>, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| Self::pool_error(&err))?;
        self.registration_dao.get_registration_list(&mut connection).await
    }

    /**
     * Retrieves a registration by id.
     */
    pub async fn get_registration(&self, registration_id: i64) -> Result<RegistrationDetailType, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| Self::pool_error(&err))?;
        self.registration_dao.get_registration(&mut connection, registration_id).await
    }

    /**
     * Adds a new registration stamped with the current time.
     *
     * # Arguments
     * `registration_input`: Validated registration fields.
     *
     * # Returns
     * A Result containing the id of the new registration or an `ApplicationError`.
     */
    pub async fn add_registration(&self, registration_input: RegistrationInputType) -> Result<i64, ApplicationError> {
        let mut transaction = self.begin().await?;
        let result = self.registration_dao.add_registration(&mut transaction, registration_input, Utc::now()).await;
        Self::finish_transaction(transaction, result).await
    }

    /**
     * Overwrites a registration.
     *
     * # Arguments
     * `registration_id`: The id of the registration to update.
     * `registration_input`: Replacement fields.
     */
    pub async fn update_registration(&self, registration_id: i64, registration_input: RegistrationInputType) -> Result<(), ApplicationError> {
        let mut transaction = self.begin().await?;
        let result = self.registration_dao.update_registration(&mut transaction, registration_id, registration_input).await;
        Self::finish_transaction(transaction, result).await
    }

    /**
     * Deletes a registration by its id.
     */
    pub async fn delete_registration(&self, registration_id: i64) -> Result<(), ApplicationError> {
        let mut transaction = self.begin().await?;
        let result = self.registration_dao.delete_registration(&mut transaction, registration_id).await;
        Self::finish_transaction(transaction, result).await
    }

    /**
     * Reports whether the database answers a trivial query.
     */
    pub async fn is_database_available(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.connection_pool).await.is_ok()
    }

    /**
     * Connection pool statistics as (size, idle connections, max connections).
     */
    pub fn pool_statistics(&self) -> (u32, usize, u32) {
        (self.connection_pool.size(), self.connection_pool.num_idle(), self.connection_pool.options().get_max_connections())
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, ApplicationError> {
        self.connection_pool.begin().await.map_err(|err| Self::pool_error(&err))
    }

    /**
     * Commits the transaction when the operation succeeded, rolls it back otherwise.
     */
    async fn finish_transaction<T>(transaction: Transaction<'static, Sqlite>, result: Result<T, ApplicationError>) -> Result<T, ApplicationError> {
        match result {
            Ok(value) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::Database, format!("Failed to commit transaction: {err}")))?;
                Ok(value)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::Database, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    fn pool_error(err: &sqlx::Error) -> ApplicationError {
        tracing::error!("Failed to get database connection: {}", err);
        ApplicationError::new(ErrorType::Database, "데이터베이스에 연결할 수 없습니다.")
    }
}
