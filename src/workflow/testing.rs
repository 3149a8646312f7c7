//! In-memory doubles for the gateway and notifier.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::gateway::types::{Endpoint, Envelope, FormBody};
use crate::gateway::Gateway;
use crate::notify::Notifier;

pub fn ok_with(data: Value) -> Envelope {
    Envelope {
        code: 200,
        msg: "request succeeded".to_string(),
        success: Some(true),
        data: Some(data),
        ..Default::default()
    }
}

pub fn rejected(msg: &str) -> Envelope {
    Envelope {
        code: 1500,
        msg: msg.to_string(),
        success: Some(false),
        data: None,
        ..Default::default()
    }
}

#[derive(Clone)]
enum Reply {
    Envelope(Envelope),
    TransportFailure,
}

#[derive(Default)]
struct Script {
    queued: VecDeque<Reply>,
    fallback: Option<Reply>,
}

/// Gateway answering from per-endpoint scripts: queued replies first, then
/// the fallback. Endpoints without a script fail at the transport level.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<Endpoint, Script>>,
    calls: Mutex<Vec<(Endpoint, FormBody)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always(&self, endpoint: Endpoint, envelope: Envelope) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(endpoint).or_default();
        script.queued.clear();
        script.fallback = Some(Reply::Envelope(envelope));
    }

    pub fn always_fail(&self, endpoint: Endpoint) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(endpoint).or_default();
        script.queued.clear();
        script.fallback = Some(Reply::TransportFailure);
    }

    /// Queue replies served before the fallback.
    pub fn queue(&self, endpoint: Endpoint, replies: Vec<Envelope>) {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(endpoint).or_default();
        script
            .queued
            .extend(replies.into_iter().map(Reply::Envelope));
    }

    pub fn forms(&self, endpoint: Endpoint) -> Vec<FormBody> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .map(|(_, form)| form.clone())
            .collect()
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.forms(endpoint).len()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn call(&self, endpoint: Endpoint, form: FormBody) -> Result<Envelope> {
        self.calls.lock().unwrap().push((endpoint, form));

        let reply = {
            let mut scripts = self.scripts.lock().unwrap();
            scripts.get_mut(&endpoint).and_then(|script| {
                script
                    .queued
                    .pop_front()
                    .or_else(|| script.fallback.clone())
            })
        };

        match reply {
            Some(Reply::Envelope(envelope)) => Ok(envelope),
            Some(Reply::TransportFailure) | None => Err(AppError::Transport {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// Notifier remembering every delivered message.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(AppError::Notification("channel unavailable".to_string()));
        }
        Ok(())
    }
}
