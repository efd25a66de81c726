//! Ordered endpoint probing.
//!
//! A [`Prober`] walks a fixed list of candidate URLs strictly in order, once
//! each, and stops at the first response the caller accepts. There is no
//! retry and no backoff; the list is the whole strategy.

use serde_json::Value;
use tracing::{debug, info, warn, Level};

use super::HttpClient;

/// What a candidate endpoint is expected to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Catalog,
    Spec,
    Detail,
}

/// A URL to try, with the content types it is expected to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidate {
    pub url: String,
    pub purpose: Purpose,
    pub expected_content_types: Vec<String>,
}

impl EndpointCandidate {
    pub fn new(url: impl Into<String>, purpose: Purpose) -> Self {
        Self {
            url: url.into(),
            purpose,
            expected_content_types: vec![
                "application/json".to_string(),
                "text/html".to_string(),
            ],
        }
    }
}

/// Catalog endpoints in probe order.
pub fn catalog_candidates(api_base: &str) -> Vec<EndpointCandidate> {
    let base = api_base.trim_end_matches('/');
    [
        base.to_string(),
        format!("{}/specs", base),
        format!("{}/api-catalog", base),
        format!("{}/services", base),
        format!("{}/plugins", base),
    ]
    .into_iter()
    .map(|url| EndpointCandidate::new(url, Purpose::Catalog))
    .collect()
}

/// A 200 response body, classified by its Content-Type.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Json(Value),
    Html(String),
}

/// The accepted response of a probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbedResponse {
    pub endpoint: String,
    pub content: Classified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// Next candidate index to try.
    Pending(usize),
    /// Accepted endpoint URL.
    Success(String),
    Exhausted,
}

/// Reason a single candidate was not accepted.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug)]
pub enum AttemptOutcome {
    Accepted,
    /// 200 but the caller found nothing usable in it.
    Rejected,
    Failed(ProbeError),
}

#[derive(Debug)]
pub struct ProbeAttempt {
    pub url: String,
    pub outcome: AttemptOutcome,
}

pub struct Prober {
    candidates: Vec<EndpointCandidate>,
    state: ProbeState,
    attempts: Vec<ProbeAttempt>,
}

impl Prober {
    pub fn new(candidates: Vec<EndpointCandidate>) -> Self {
        let state = if candidates.is_empty() {
            ProbeState::Exhausted
        } else {
            ProbeState::Pending(0)
        };
        Self {
            candidates,
            state,
            attempts: Vec::new(),
        }
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn attempts(&self) -> &[ProbeAttempt] {
        &self.attempts
    }

    pub fn candidates(&self) -> &[EndpointCandidate] {
        &self.candidates
    }

    /// Probe until the first 200 response, whatever its content.
    pub async fn probe_all(
        &mut self,
        client: &HttpClient,
        headers: &[(String, String)],
    ) -> Option<ProbedResponse> {
        self.probe_until(client, headers, |endpoint, content| {
            Some(ProbedResponse {
                endpoint: endpoint.to_string(),
                content,
            })
        })
        .await
    }

    /// Probe until `accept` returns `Some` for a 200 response.
    ///
    /// Non-200 statuses, transport failures, malformed JSON and rejected
    /// bodies all advance to the next candidate.
    pub async fn probe_until<T, F>(
        &mut self,
        client: &HttpClient,
        headers: &[(String, String)],
        mut accept: F,
    ) -> Option<T>
    where
        F: FnMut(&str, Classified) -> Option<T>,
    {
        let start = match self.state {
            ProbeState::Pending(index) => index,
            ProbeState::Success(_) | ProbeState::Exhausted => return None,
        };

        for index in start..self.candidates.len() {
            self.state = ProbeState::Pending(index);
            let url = self.candidates[index].url.clone();
            debug!("Probing {}", url);

            let classified = match fetch_classified(client, &url, headers).await {
                Ok(content) => content,
                Err(error) => {
                    log_failure(&url, &error);
                    self.attempts.push(ProbeAttempt {
                        url,
                        outcome: AttemptOutcome::Failed(error),
                    });
                    continue;
                }
            };

            match accept(&url, classified) {
                Some(accepted) => {
                    info!("Endpoint {} accepted", url);
                    self.attempts.push(ProbeAttempt {
                        url: url.clone(),
                        outcome: AttemptOutcome::Accepted,
                    });
                    self.state = ProbeState::Success(url);
                    return Some(accepted);
                }
                None => {
                    debug!("Endpoint {} returned nothing usable", url);
                    self.attempts.push(ProbeAttempt {
                        url,
                        outcome: AttemptOutcome::Rejected,
                    });
                }
            }
        }

        self.state = ProbeState::Exhausted;
        None
    }
}

async fn fetch_classified(
    client: &HttpClient,
    url: &str,
    headers: &[(String, String)],
) -> Result<Classified, ProbeError> {
    let response = client.get(url, headers).await?;
    let status = response.status_code();
    if status != 200 {
        return Err(ProbeError::Status(status));
    }

    let is_json = response.is_json();
    let body = response.text().await?;
    if is_json {
        Ok(Classified::Json(serde_json::from_str(&body)?))
    } else {
        Ok(Classified::Html(body))
    }
}

/// Log level for a failed attempt.
fn failure_level(error: &ProbeError) -> Level {
    match error {
        ProbeError::Status(404) => Level::DEBUG,
        _ => Level::WARN,
    }
}

fn log_failure(url: &str, error: &ProbeError) {
    let message = match error {
        ProbeError::Status(401) | ProbeError::Status(403) => {
            format!("Access denied by {} ({})", url, error)
        }
        ProbeError::Status(404) => format!("{} not found", url),
        ProbeError::Status(_) => format!("{} returned {}", url, error),
        ProbeError::MalformedJson(_) => format!("{} sent {}", url, error),
        ProbeError::Transport(_) => format!("{} failed: {}", url, error),
    };
    if failure_level(error) == Level::WARN {
        warn!("{}", message);
    } else {
        debug!("{}", message);
    }
}
