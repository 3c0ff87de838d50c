//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use blogdesk_auth::Credentials;

use crate::collaborators::{Collaborators, Navigator, Notice, Notifier, ProgressIndicator, Severity};
use crate::routes::RouteName;
use crate::session::Session;
use crate::transport::{ApiRequest, Method, RawResponse, Transport, TransportError};

/// Everything observable the core did, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request(String),
    Notice(Severity, String),
    ProgressStart,
    ProgressStop,
    Push(RouteName),
    Title(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// A request as the transport saw it.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub method: Method,
    pub endpoint: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

enum Scripted {
    Reply(RawResponse),
    Fail(TransportError),
}

/// Transport answering from a per-endpoint script.
///
/// Replies queue up per endpoint; the last one repeats. Endpoints without a
/// script fail with a connection error.
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    sent: Mutex<Vec<SentRequest>>,
    log: EventLog,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Self::logging_to(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn logging_to(log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            log,
        })
    }

    pub fn reply(&self, endpoint: &str, http_status: u16, body: Value) {
        self.reply_raw(endpoint, http_status, serde_json::to_vec(&body).unwrap());
    }

    pub fn reply_raw(&self, endpoint: &str, http_status: u16, body: Vec<u8>) {
        self.push(endpoint, Scripted::Reply(RawResponse { http_status, body }));
    }

    pub fn fail(&self, endpoint: &str, err: TransportError) {
        self.push(endpoint, Scripted::Fail(err));
    }

    fn push(&self, endpoint: &str, entry: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(entry);
    }

    pub fn requests(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.requests().iter().filter(|r| r.endpoint == endpoint).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let endpoint = request.endpoint().to_string();
        self.log.lock().unwrap().push(Event::Request(endpoint.clone()));
        self.sent.lock().unwrap().push(SentRequest {
            method: request.method,
            endpoint: endpoint.clone(),
            authorization: request
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: request.body.clone(),
        });

        let mut script = self.script.lock().unwrap();
        let Some(queue) = script.get_mut(&endpoint) else {
            return Err(TransportError::Connect(format!("no script for {endpoint}")));
        };

        let entry = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|e| match e {
                Scripted::Reply(r) => Scripted::Reply(r.clone()),
                Scripted::Fail(f) => Scripted::Fail(f.clone()),
            })
        };

        match entry {
            Some(Scripted::Reply(r)) => Ok(r),
            Some(Scripted::Fail(f)) => Err(f),
            None => Err(TransportError::Connect(format!("no script for {endpoint}"))),
        }
    }
}

/// Records notices, progress signals and navigation.
pub struct Recorder {
    log: EventLog,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(Severity, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notice(s, m) => Some((s, m)),
                _ => None,
            })
            .collect()
    }

    pub fn pushes(&self) -> Vec<RouteName> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Push(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators::new(self.clone(), self.clone(), self.clone())
    }

    fn record(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }
}

impl Notifier for Recorder {
    fn notify(&self, notice: Notice) {
        self.record(Event::Notice(notice.severity, notice.message));
    }
}

impl ProgressIndicator for Recorder {
    fn start(&self) {
        self.record(Event::ProgressStart);
    }

    fn stop(&self) {
        self.record(Event::ProgressStop);
    }
}

impl Navigator for Recorder {
    fn push(&self, route: &RouteName) {
        self.record(Event::Push(route.clone()));
    }

    fn set_title(&self, title: &str) {
        self.record(Event::Title(title.to_string()));
    }
}

/// Transport that signs the session in again with `reissued` while the first
/// request is in flight and answers it with a credential-invalid envelope.
/// Later requests, made with the reissued token, are accepted.
pub struct ReissuingTransport {
    session: Session,
    reissued: String,
    calls: AtomicUsize,
}

impl ReissuingTransport {
    pub fn new(session: &Session, reissued: &str) -> Arc<Self> {
        Arc::new(Self {
            session: session.clone(),
            reissued: reissued.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ReissuingTransport {
    async fn execute(&self, _request: ApiRequest) -> Result<RawResponse, TransportError> {
        let body: &[u8] = if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.session.set(credentials(&self.reissued, "admin")).await;
            br#"{"status":2,"msg":"token expired"}"#
        } else {
            br#"{"status":0,"data":{}}"#
        };
        Ok(RawResponse {
            http_status: 200,
            body: body.to_vec(),
        })
    }
}

pub fn credentials(token: &str, scope: &str) -> Credentials {
    Credentials {
        token: token.to_string(),
        scope: scope.to_string(),
        refresh_token: format!("refresh-{token}"),
        expired_at: 1_700_000_000,
    }
}

pub async fn signed_in(token: &str, scope: &str) -> Session {
    let session = Session::detached();
    session.set(credentials(token, scope)).await;
    session
}
