use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Message returned when a required text field is missing.
 */
pub const MISSING_FIELD_MESSAGE: &str = "모든 필드를 입력해주세요.";

/**
 * Message returned when the privacy agreement is required but not given.
 */
pub const PRIVACY_AGREEMENT_MESSAGE: &str = "개인정보 수집 및 이용에 동의해주세요.";

/**
 * Fields of a registration that can be marked as required.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationField {
    Name,
    Gender,
    Address,
    Phone,
    Birthdate,
    LivingType,
    Program,
    PrivacyAgreement,
}

impl RegistrationField {
    /**
     * Fields required when nothing else is configured.
     */
    pub fn defaults() -> BTreeSet<RegistrationField> {
        BTreeSet::from([
            RegistrationField::Name,
            RegistrationField::Gender,
            RegistrationField::Address,
            RegistrationField::Phone,
            RegistrationField::Birthdate,
            RegistrationField::LivingType,
            RegistrationField::Program,
        ])
    }
}

/**
 * A registration as submitted, before validation. Every field may be absent.
 */
#[derive(Debug, Clone, Default)]
pub struct RegistrationSubmissionType {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub birthdate: Option<String>,
    pub living_type: Option<String>,
    pub program: Option<String>,
    pub privacy_agreement: Option<bool>,
}

impl RegistrationSubmissionType {
    /**
     * Checks the submission against the required field set.
     *
     * # Arguments
     * `required_fields`: Fields that must be present. Text fields must be non-blank, the privacy
     * agreement must be given.
     *
     * # Returns
     * The validated input, or a validation error. Optional text fields that were not sent are
     * stored as empty strings.
     */
    pub fn validate(self, required_fields: &BTreeSet<RegistrationField>) -> Result<RegistrationInputType, ApplicationError> {
        let text_fields = [
            (RegistrationField::Name, &self.name),
            (RegistrationField::Gender, &self.gender),
            (RegistrationField::Address, &self.address),
            (RegistrationField::Phone, &self.phone),
            (RegistrationField::Birthdate, &self.birthdate),
            (RegistrationField::LivingType, &self.living_type),
            (RegistrationField::Program, &self.program),
        ];
        for (field, value) in text_fields {
            if required_fields.contains(&field) && is_blank(value.as_deref()) {
                tracing::debug!("Registration rejected, missing field {:?}", field);
                return Err(ApplicationError::new(ErrorType::Validation, MISSING_FIELD_MESSAGE));
            }
        }
        let privacy_agreement = self.privacy_agreement.unwrap_or(false);
        if required_fields.contains(&RegistrationField::PrivacyAgreement) && !privacy_agreement {
            tracing::debug!("Registration rejected, privacy agreement not given");
            return Err(ApplicationError::new(ErrorType::Validation, PRIVACY_AGREEMENT_MESSAGE));
        }
        Ok(RegistrationInputType {
            name: self.name.unwrap_or_default(),
            gender: self.gender.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            birthdate: self.birthdate.unwrap_or_default(),
            living_type: self.living_type.unwrap_or_default(),
            program: self.program.unwrap_or_default(),
            privacy_agreement,
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

/**
 * Validated registration fields used for inserts and full overwrites.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationInputType {
    pub name: String,
    pub gender: String,
    pub address: String,
    pub phone: String,
    pub birthdate: String,
    pub living_type: String,
    pub program: String,
    pub privacy_agreement: bool,
}

/**
 * A stored registration.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDetailType {
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
