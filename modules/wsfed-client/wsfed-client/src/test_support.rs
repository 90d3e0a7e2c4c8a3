//! Scripted transport for handshake tests.

use std::collections::VecDeque;

use parking_lot::Mutex;
use wsfed_client_sdk::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Replays queued outcomes in order and records every request it receives.
///
/// Running past the end of the script fails with [`TransportError::Io`].
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: HttpResponse) -> Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.script.lock().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = request.method.as_str();
        let url = request.url.clone();
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Io {
                    method,
                    url,
                    message: "no scripted response left".to_owned(),
                })
            })
    }
}
