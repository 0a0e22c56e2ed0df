//! In-memory transport that answers from a per-route script and records
//! every request it sees. Used by the test suites; never touches the network.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use super::transport::{Method, PreparedRequest, RawResponse, Transport};
use crate::error::TransportError;

#[derive(Debug)]
enum Reply {
    Respond(RawResponse),
    Fail(String),
}

#[derive(Debug, Default)]
struct Script {
    routes: HashMap<(Method, String), VecDeque<Reply>>,
    requests: Vec<PreparedRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `response` for the next `method` request to `path` (query included).
    pub fn on(&self, method: Method, path: &str, response: RawResponse) -> &Self {
        self.push(method, path, Reply::Respond(response))
    }

    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Reply::Fail(message.to_string()))
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.script.lock().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.script
            .lock()
            .requests
            .iter()
            .filter(|request| request.method == method && path_of(&request.url) == path)
            .count()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.script
            .lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        let key = (request.method, path_of(&request.url).to_string());
        let reply = {
            let mut script = self.script.lock();
            script.requests.push(request);
            script.routes.get_mut(&key).and_then(VecDeque::pop_front)
        };

        // Let other tasks run while this request is "in flight".
        tokio::task::yield_now().await;

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new(format!(
                "no scripted reply for {} {}",
                key.0, key.1
            ))),
        }
    }
}

fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    after_scheme
        .find('/')
        .map_or("/", |idx| &after_scheme[idx..])
}
