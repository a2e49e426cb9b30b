#![allow(dead_code)]

use http::Method;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use waypoint::dispatcher::{Request, Response};
use waypoint::error::HandlerError;
use waypoint::interceptor::Interceptor;
use waypoint::runtime_config::RuntimeConfig;

/// Runtime settings independent of the test process environment.
pub fn test_runtime_config() -> RuntimeConfig {
    RuntimeConfig::default()
}

pub fn get(url: &str) -> Request {
    request(Method::GET, url)
}

pub fn request(method: Method, url: &str) -> Request {
    Request::from_url(method, url).unwrap()
}

/// Handler returning `{"handler": name}` with status 200.
pub fn named(
    name: &'static str,
) -> impl Fn(&Request) -> Result<Response, HandlerError> + Send + Sync + 'static {
    move |_req| Ok(Response::json(200, json!({ "handler": name })))
}

/// Shared, ordered log of interceptor hook calls.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Interceptor that records its hook calls and can be told to fail.
pub struct Recorder {
    pub name: &'static str,
    pub log: CallLog,
    pub fail_before: bool,
    pub fail_after: bool,
}

impl Recorder {
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_before: false,
            fail_after: false,
        }
    }

    pub fn failing_before(mut self) -> Self {
        self.fail_before = true;
        self
    }

    pub fn failing_after(mut self) -> Self {
        self.fail_after = true;
        self
    }
}

impl Interceptor for Recorder {
    fn before_handle(&self, _req: &Request) -> Result<(), HandlerError> {
        self.log.push(format!("{}.before", self.name));
        if self.fail_before {
            return Err(HandlerError::IllegalState(format!("{} refused", self.name)));
        }
        Ok(())
    }

    fn after_handle(
        &self,
        _req: &Request,
        res: &mut Response,
        _latency: Duration,
    ) -> Result<(), HandlerError> {
        self.log.push(format!("{}.after", self.name));
        res.set_header(&format!("x-{}", self.name), "seen".to_string());
        if self.fail_after {
            return Err(HandlerError::IllegalArgument(format!("{} failed", self.name)));
        }
        Ok(())
    }
}
