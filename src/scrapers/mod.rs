//! HTTP plumbing for the catalog portal: the shared client and the ordered
//! endpoint prober.

mod http_client;
pub mod prober;

pub use http_client::{
    resolve_user_agent, HttpClient, HttpResponse, RequestHeaders, BROWSER_USER_AGENT, USER_AGENT,
};
pub use prober::{
    catalog_candidates, AttemptOutcome, Classified, EndpointCandidate, ProbeAttempt, ProbeError,
    ProbeState, ProbedResponse, Prober, Purpose,
};

use crate::config::Settings;

/// Build the scraping client from settings.
pub fn client_from_settings(settings: &Settings) -> Result<HttpClient, reqwest::Error> {
    HttpClient::with_user_agent(
        settings.request_timeout(),
        std::time::Duration::ZERO,
        settings.user_agent.as_deref(),
    )
}
