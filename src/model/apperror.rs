use std::fmt;

/**
 * Represents the type of error that can occur within the application.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    /**
     * Startup failures (configuration, database connection, migrations).
     */
    Initialization,
    /**
     * A submission is missing a required field or the body could not be parsed.
     */
    Validation,
    /**
     * No registration with the requested id.
     */
    NotFound,
    /**
     * Underlying data store failure.
     */
    Database,
    /**
     * Missing or incorrect admin credentials.
     */
    Unauthorized,
    /**
     * Building or writing an export failed.
     */
    Export,
    /**
     * The client could not reach the registration service.
     */
    Connection,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem. Returned to the caller as is.
     */
    pub message: String,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        ApplicationError { error_type, message: message.into() }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApplicationError {}
