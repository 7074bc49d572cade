//! Recording transport shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reader_core::{CallContext, Client, Config, HttpRequest, HttpResponse, Transport};

/// Records requests and answers with canned responses in order.
#[derive(Clone, Default)]
pub struct Recorder {
    sent: Arc<Mutex<Vec<HttpRequest>>>,
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
}

impl Recorder {
    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for Recorder {
    fn execute(&self, _: &CallContext, request: HttpRequest) -> reader_core::Result<HttpResponse> {
        self.sent.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request"))
    }
}

/// A client that replies with `responses`, plus a handle on what it sent.
pub fn recording_client(responses: Vec<HttpResponse>) -> (Client<Recorder>, Recorder) {
    let recorder = Recorder {
        responses: Arc::new(Mutex::new(responses.into())),
        ..Recorder::default()
    };
    let config = Config::new("test-token").unwrap();
    (Client::with_transport(&config, recorder.clone()), recorder)
}

pub fn body(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_str(request.body.as_deref().unwrap()).unwrap()
}
