//! Classified request pipeline used by feature code.

use serde_json::Value;

use blogdesk_core::Envelope;

use crate::classifier::ErrorClassifier;
use crate::error::{ClientError, ClientResult};
use crate::gateway::{ApiFailure, Gateway};
use crate::transport::ApiRequest;

/// Sends a request and runs recovery on failure.
///
/// By the time an `Err` comes back the user has been notified and any
/// teardown or redirect has happened. The error still carries the class so
/// the calling view can react (stop a spinner, keep a form open).
#[derive(Clone)]
pub struct ApiClient {
    gateway: Gateway,
    classifier: ErrorClassifier,
}

impl ApiClient {
    pub fn new(gateway: Gateway, classifier: ErrorClassifier) -> Self {
        Self { gateway, classifier }
    }

    pub async fn send(&self, request: ApiRequest) -> ClientResult<Envelope> {
        match self.gateway.send_tracked(request).await {
            (_, Ok(envelope)) => Ok(envelope),
            (sent_with, Err(failure)) => Err(self.fail(failure, sent_with.as_deref()).await),
        }
    }

    pub async fn get(&self, path: &str) -> ClientResult<Envelope> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ClientResult<Envelope> {
        self.send(ApiRequest::post(path, body)).await
    }

    /// Bypass classification. Used for calls whose failure must not trigger
    /// recovery, such as session validation.
    pub async fn send_unclassified(&self, request: ApiRequest) -> Result<Envelope, ApiFailure> {
        self.gateway.send_unclassified(request).await
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    async fn fail(&self, failure: ApiFailure, sent_with: Option<&str>) -> ClientError {
        let recovery = self.classifier.recover(&failure, sent_with).await;
        tracing::debug!(class = %recovery.class, action = ?recovery.action, "call failed");
        ClientError::Api {
            class: recovery.class,
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ErrorClass;
    use crate::collaborators::Severity;
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::testing::{Recorder, ReissuingTransport, ScriptedTransport, signed_in};
    use crate::validation::SessionValidator;
    use serde_json::json;
    use std::sync::Arc;

    fn client(transport: Arc<ScriptedTransport>, session: &Session, recorder: &Arc<Recorder>) -> ApiClient {
        let config = ClientConfig::default();
        let collaborators = recorder.collaborators();
        let gateway = Gateway::new(transport, session.clone());
        let validator = SessionValidator::new(
            gateway.clone(),
            session.clone(),
            collaborators.notifier.clone(),
            config.notice_duration,
        );
        let classifier = ErrorClassifier::new(&config, session.clone(), validator, &collaborators);
        ApiClient::new(gateway, classifier)
    }

    #[tokio::test]
    async fn success_is_returned_untouched() {
        let transport = ScriptedTransport::new();
        transport.reply("authrequired/getSiteInfo", 200, json!({ "status": 0, "data": { "posts": 3 } }));
        let recorder = Recorder::new();
        let session = signed_in("t-1", "admin").await;

        let env = client(transport, &session, &recorder)
            .get("authrequired/getSiteInfo")
            .await
            .unwrap();

        assert_eq!(env.data.unwrap()["posts"], 3);
        assert!(recorder.events().iter().all(|e| !matches!(e, crate::testing::Event::Notice(..))));
    }

    #[tokio::test]
    async fn failure_carries_class_after_recovery() {
        let transport = ScriptedTransport::new();
        transport.reply("authrequired/admin/posts", 200, json!({ "status": 2, "msg": "expired" }));
        let recorder = Recorder::new();
        let session = signed_in("t-1", "admin").await;

        let err = client(transport, &session, &recorder)
            .post("authrequired/admin/posts", json!({ "title": "x" }))
            .await
            .unwrap_err();

        assert_eq!(err.class(), Some(&ErrorClass::CredentialInvalid));
        assert!(!session.is_authenticated());
        assert_eq!(recorder.notices()[0].0, Severity::Warning);
    }

    #[tokio::test]
    async fn late_rejection_of_a_replaced_token_keeps_the_new_session() {
        let recorder = Recorder::new();
        let session = signed_in("t-1", "admin").await;
        let config = ClientConfig::default();
        let collaborators = recorder.collaborators();
        let gateway = Gateway::new(ReissuingTransport::new(&session, "t-2"), session.clone());
        let validator = SessionValidator::new(
            gateway.clone(),
            session.clone(),
            collaborators.notifier.clone(),
            config.notice_duration,
        );
        let classifier = ErrorClassifier::new(&config, session.clone(), validator, &collaborators);

        let err = ApiClient::new(gateway, classifier)
            .get("authrequired/admin/posts")
            .await
            .unwrap_err();

        assert_eq!(err.class(), Some(&ErrorClass::CredentialInvalid));
        assert_eq!(session.token().as_deref(), Some("t-2"));
        assert!(recorder.notices().is_empty());
    }

    #[tokio::test]
    async fn unclassified_path_runs_no_recovery() {
        let transport = ScriptedTransport::new();
        transport.reply("isValid", 200, json!({ "status": 2 }));
        let recorder = Recorder::new();
        let session = signed_in("t-1", "admin").await;

        let failure = client(transport, &session, &recorder)
            .send_unclassified(ApiRequest::get("isValid"))
            .await
            .unwrap_err();

        assert!(matches!(failure, ApiFailure::Rejected { .. }));
        assert!(session.is_authenticated());
        assert!(recorder.events().is_empty());
    }
}
