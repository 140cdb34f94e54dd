use serde::Serialize;
use serde_json::Value;

use crate::{
    api::rest::ApiResponse,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::PRIVACY_AGREEMENT_MESSAGE,
    },
};

const SUCCESS_MESSAGE: &str = "접수가 완료되었습니다.";
const FALLBACK_ERROR_MESSAGE: &str = "접수 중 오류가 발생했습니다.";
const CONNECTION_FAILED_MESSAGE: &str = "서버 연결에 실패했습니다. 다시 시도해주세요.";
const IN_PROGRESS_MESSAGE: &str = "접수 처리 중입니다. 잠시만 기다려주세요.";

/**
 * Values entered in the registration form.
 */
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
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
 * Transport used by the form to reach the registration server.
 */
#[allow(async_fn_in_trait)]
pub trait RegistrationGateway {
    /**
     * Posts the form to the server.
     *
     * # Returns
     * Whether the server answered with a success status together with the decoded envelope, or a
     * `Connection` error when the server could not be reached.
     */
    async fn create_registration(&self, form: &RegistrationForm) -> Result<(bool, ApiResponse<Value>), ApplicationError>;
}

/**
 * Gateway posting to a running server over HTTP.
 */
pub struct HttpRegistrationGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistrationGateway {
    pub fn new(base_url: &str) -> Self {
        HttpRegistrationGateway { client: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }
}

impl RegistrationGateway for HttpRegistrationGateway {
    async fn create_registration(&self, form: &RegistrationForm) -> Result<(bool, ApiResponse<Value>), ApplicationError> {
        let response = self.client.post(format!("{}/api/registrations", self.base_url)).json(form).send().await.map_err(|err| {
            tracing::error!("Failed to reach registration server: {}", err);
            ApplicationError::new(ErrorType::Connection, CONNECTION_FAILED_MESSAGE)
        })?;
        let ok = response.status().is_success();
        let envelope = response.json::<ApiResponse<Value>>().await.unwrap_or_else(|err| {
            tracing::warn!("Unreadable response from registration server: {}", err);
            ApiResponse { success: false, message: None, data: None, id: None }
        });
        Ok((ok, envelope))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMessageKind {
    Success,
    Error,
}

/**
 * Message shown below the form after a submission.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessage {
    pub kind: FormMessageKind,
    pub text: String,
}

/**
 * Drives a registration form: holds the entered values, guards against double submission and
 * reports the outcome of each submission.
 */
pub struct FormController<G: RegistrationGateway> {
    gateway: G,
    pub form: RegistrationForm,
    submit_enabled: bool,
    message: Option<FormMessage>,
}

impl<G: RegistrationGateway> FormController<G> {
    pub fn new(gateway: G) -> Self {
        FormController { gateway, form: RegistrationForm::default(), submit_enabled: true, message: None }
    }

    pub fn message(&self) -> Option<&FormMessage> {
        self.message.as_ref()
    }

    /**
     * Submits the current form.
     *
     * The submit control is disabled while the request is in flight and enabled again afterwards,
     * whatever the outcome. A successful submission clears the form.
     *
     * # Returns
     * The message shown to the user.
     */
    pub async fn submit(&mut self) -> FormMessage {
        let form = match self.begin_submission() {
            Ok(form) => form,
            Err(message) => {
                self.message = Some(message.clone());
                return message;
            }
        };
        let result = self.gateway.create_registration(&form).await;
        self.complete_submission(result)
    }

    /**
     * Checks the form and disables the submit control.
     *
     * # Returns
     * The values to send, or the message to show when nothing may be sent.
     */
    fn begin_submission(&mut self) -> Result<RegistrationForm, FormMessage> {
        if !self.submit_enabled {
            return Err(FormMessage { kind: FormMessageKind::Error, text: IN_PROGRESS_MESSAGE.to_string() });
        }
        if !self.form.privacy_agreement {
            return Err(FormMessage { kind: FormMessageKind::Error, text: PRIVACY_AGREEMENT_MESSAGE.to_string() });
        }
        self.submit_enabled = false;
        Ok(self.form.clone())
    }

    /**
     * Re-enables the submit control and records the outcome of a request.
     */
    fn complete_submission(&mut self, result: Result<(bool, ApiResponse<Value>), ApplicationError>) -> FormMessage {
        self.submit_enabled = true;
        let message = match result {
            Ok((true, envelope)) if envelope.success => {
                tracing::info!("Registration submitted with id {:?}", envelope.id);
                self.form = RegistrationForm::default();
                FormMessage { kind: FormMessageKind::Success, text: SUCCESS_MESSAGE.to_string() }
            }
            Ok((_, envelope)) => FormMessage { kind: FormMessageKind::Error, text: envelope.message.unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()) },
            Err(_) => FormMessage { kind: FormMessageKind::Error, text: CONNECTION_FAILED_MESSAGE.to_string() },
        };
        self.message = Some(message.clone());
        message
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::*;

    enum Reply {
        Created,
        Rejected(Option<&'static str>),
        Unreachable,
    }

    struct FakeGateway {
        reply: Reply,
        sent: RefCell<Vec<RegistrationForm>>,
    }

    impl FakeGateway {
        fn new(reply: Reply) -> Self {
            FakeGateway { reply, sent: RefCell::new(vec![]) }
        }
    }

    impl RegistrationGateway for FakeGateway {
        async fn create_registration(&self, form: &RegistrationForm) -> Result<(bool, ApiResponse<Value>), ApplicationError> {
            self.sent.borrow_mut().push(form.clone());
            match self.reply {
                Reply::Created => Ok((true, ApiResponse { success: true, message: Some(SUCCESS_MESSAGE.to_string()), data: None, id: Some(1) })),
                Reply::Rejected(message) => Ok((false, ApiResponse { success: false, message: message.map(str::to_string), data: None, id: None })),
                Reply::Unreachable => Err(ApplicationError::new(ErrorType::Connection, "connection refused")),
            }
        }
    }

    fn filled_form() -> RegistrationForm {
        RegistrationForm {
            name: "홍길동".to_string(),
            gender: "male".to_string(),
            address: "서울시 강남구".to_string(),
            phone: "010-1234-5678".to_string(),
            birthdate: "1990-01-01".to_string(),
            living_type: "general".to_string(),
            program: "yoga".to_string(),
            privacy_agreement: true,
        }
    }

    #[tokio::test]
    async fn test_successful_submission_resets_form() {
        let mut controller = FormController::new(FakeGateway::new(Reply::Created));
        controller.form = filled_form();
        let message = controller.submit().await;
        assert_eq!(message.kind, FormMessageKind::Success);
        assert_eq!(message.text, SUCCESS_MESSAGE);
        assert_eq!(controller.form, RegistrationForm::default());
        assert!(controller.submit_enabled);
        assert_eq!(controller.message(), Some(&message));
        assert_eq!(controller.gateway.sent.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_privacy_agreement_is_not_sent() {
        let mut controller = FormController::new(FakeGateway::new(Reply::Created));
        controller.form = RegistrationForm { privacy_agreement: false, ..filled_form() };
        let message = controller.submit().await;
        assert_eq!(message.kind, FormMessageKind::Error);
        assert_eq!(message.text, PRIVACY_AGREEMENT_MESSAGE);
        assert!(controller.gateway.sent.borrow().is_empty());
        assert!(controller.submit_enabled);
        assert_eq!(controller.form.name, "홍길동");
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_form() {
        let mut controller = FormController::new(FakeGateway::new(Reply::Rejected(Some("모든 필드를 입력해주세요."))));
        controller.form = filled_form();
        let message = controller.submit().await;
        assert_eq!(message.kind, FormMessageKind::Error);
        assert_eq!(message.text, "모든 필드를 입력해주세요.");
        assert_eq!(controller.form, filled_form());
        assert!(controller.submit_enabled);
    }

    #[tokio::test]
    async fn test_server_rejection_without_message() {
        let mut controller = FormController::new(FakeGateway::new(Reply::Rejected(None)));
        controller.form = filled_form();
        assert_eq!(controller.submit().await.text, FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let mut controller = FormController::new(FakeGateway::new(Reply::Unreachable));
        controller.form = filled_form();
        let message = controller.submit().await;
        assert_eq!(message.kind, FormMessageKind::Error);
        assert_eq!(message.text, CONNECTION_FAILED_MESSAGE);
        assert!(controller.submit_enabled);
        assert_eq!(controller.form, filled_form());
    }

    #[test]
    fn test_second_submission_refused_while_in_flight() {
        let mut controller = FormController::new(FakeGateway::new(Reply::Created));
        controller.form = filled_form();
        assert_eq!(controller.begin_submission().unwrap(), filled_form());
        assert!(!controller.submit_enabled);

        let refused = controller.begin_submission().unwrap_err();
        assert_eq!(refused.kind, FormMessageKind::Error);
        assert_eq!(refused.text, IN_PROGRESS_MESSAGE);

        let response = ApiResponse { success: true, message: None, data: None, id: Some(1) };
        let message = controller.complete_submission(Ok((true, response)));
        assert_eq!(message.kind, FormMessageKind::Success);
        assert!(controller.submit_enabled);
        assert!(controller.gateway.sent.borrow().is_empty());
    }

    #[test]
    fn test_form_serializes_camel_case() {
        let json = serde_json::to_value(filled_form()).unwrap();
        assert_eq!(json["livingType"], "general");
        assert_eq!(json["privacyAgreement"], true);
    }
}
