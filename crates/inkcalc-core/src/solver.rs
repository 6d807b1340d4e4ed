//! Remote solver interface.
//!
//! The solver receives the encoded sketch plus the current variable bindings
//! and answers with an ordered list of results:
//!
//! ```json
//! { "image": "data:image/png;base64,...", "dict_of_vars": { "x": "5" } }
//! { "status": "success", "data": [ { "expr": "2+2", "result": "4", "assign": false } ] }
//! ```

use crate::bindings::VariableBindings;
use crate::config::SessionConfig;
use crate::surface::SurfaceError;
use serde::{Deserialize, Deserializer, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Solve errors.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("A solve is already in flight")]
    AlreadySolving,
    #[error("No async runtime available: {0}")]
    Runtime(String),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Boxed future for solver calls. `Send` so it can run on a spawned task.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One entry of the solver's result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(rename = "expr")]
    pub expression: String,
    #[serde(rename = "result", deserialize_with = "deserialize_answer")]
    pub answer: String,
    /// Whether the result defines a variable for later solves.
    #[serde(rename = "assign", default)]
    pub is_assignment: bool,
}

impl ResultItem {
    pub fn new(expression: impl Into<String>, answer: impl Into<String>, is_assignment: bool) -> Self {
        Self {
            expression: expression.into(),
            answer: answer.into(),
            is_assignment,
        }
    }
}

/// Solvers answer with either strings or bare numbers.
fn deserialize_answer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    })
}

/// Payload sent to the solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveRequest {
    /// PNG data URL of the surface.
    pub image: String,
    #[serde(rename = "dict_of_vars")]
    pub bindings: VariableBindings,
}

/// Response envelope.
#[derive(Debug, Clone, Deserialize)]
struct SolveResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    data: Vec<ResultItem>,
}

/// Parse a solver response body. Any malformed element rejects the whole
/// response.
pub fn parse_response(body: &[u8]) -> Result<Vec<ResultItem>, SolveError> {
    let response: SolveResponse =
        serde_json::from_slice(body).map_err(|e| SolveError::MalformedResponse(e.to_string()))?;

    match response.status.as_deref() {
        Some(status) if !status.eq_ignore_ascii_case("success") => {
            return Err(SolveError::Transport(format!(
                "Solver reported {}: {}",
                status,
                response.message.unwrap_or_default()
            )));
        }
        _ => {}
    }

    Ok(response.data)
}

/// A remote (or fake) solver.
pub trait Solver: Send + Sync {
    fn solve(&self, request: SolveRequest) -> BoxFuture<'static, Result<Vec<ResultItem>, SolveError>>;
}

/// Solver reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSolver {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSolver {
    /// Build a client for the configured endpoint.
    pub fn new(config: &SessionConfig) -> Result<Self, SolveError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SolveError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Solver for HttpSolver {
    fn solve(&self, request: SolveRequest) -> BoxFuture<'static, Result<Vec<ResultItem>, SolveError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            log::debug!("POST {} ({} bindings)", endpoint, request.bindings.len());
            let response = client
                .post(&endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| SolveError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(SolveError::Transport(format!("Solver returned {}", status)));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| SolveError::Transport(e.to_string()))?;
            parse_response(&body)
        })
    }
}
