//! Scripted in-memory backend for controller tests

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fraud_console::services::api::{ApiError, Backend, RequestOptions};

/// One request as seen by the fake.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

/// Scripted outcome of a request.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16, Option<Value>),
}

impl Reply {
    fn into_result(self) -> Result<Value, ApiError> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Status(code, body) => Err(ApiError::Status {
                status: StatusCode::from_u16(code).expect("valid status code"),
                body,
            }),
        }
    }
}

type RouteKey = (&'static str, String);

/// Replies are consumed in order per `METHOD path`; the last one repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<RouteKey, VecDeque<Reply>>>,
    delays: Mutex<HashMap<RouteKey, Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &'static str, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn json(&self, method: &'static str, path: &str, value: Value) -> &Self {
        self.on(method, path, Reply::Json(value))
    }

    pub fn status(&self, method: &'static str, path: &str, code: u16, body: Option<Value>) -> &Self {
        self.on(method, path, Reply::Status(code, body))
    }

    /// Make every matching request take `delay` (virtual time under `start_paused`).
    pub fn delay(&self, method: &'static str, path: &str, delay: Duration) -> &Self {
        self.delays
            .lock()
            .unwrap()
            .insert((method, path.to_string()), delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls_to(method, path).len()
    }

    /// Highest number of requests that were awaiting a reply at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn handle(
        &self,
        method: &'static str,
        path: &str,
        token: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            token: token.map(str::to_string),
            body: options.body,
        });

        let key = (method, path.to_string());
        let delay = self.delays.lock().unwrap().get(&key).copied();
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
            .unwrap_or(Reply::Status(404, Some(serde_json::json!({"message": "Not found"}))))
            .into_result()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.handle("GET", path, token, options).await
    }

    async fn post(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.handle("POST", path, token, options).await
    }

    async fn put(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.handle("PUT", path, token, options).await
    }

    async fn delete(&self, path: &str, token: Option<&str>, options: RequestOptions) -> Result<Value, ApiError> {
        self.handle("DELETE", path, token, options).await
    }
}
