use std::time::Duration;
use ureq::Agent;

const TIMEOUT_GLOBAL: Duration = Duration::from_secs(120);
const TIMEOUT_PER_CALL: Duration = Duration::from_secs(90);
const TIMEOUT_RESOLVE: Duration = Duration::from_secs(5);
const TIMEOUT_CONNECT: Duration = Duration::from_secs(5);
const TIMEOUT_SEND_REQUEST: Duration = Duration::from_secs(5);
const TIMEOUT_SEND_BODY: Duration = Duration::from_secs(15);
const TIMEOUT_RECV_RESPONSE: Duration = Duration::from_secs(60);
const TIMEOUT_RECV_BODY: Duration = Duration::from_secs(60);

/// Agent shared by the chat providers.
///
/// Non-2xx responses are returned as regular responses so the caller can log
/// the provider's error body.
pub fn default_agent() -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(TIMEOUT_GLOBAL))
        .timeout_per_call(Some(TIMEOUT_PER_CALL))
        .timeout_resolve(Some(TIMEOUT_RESOLVE))
        .timeout_connect(Some(TIMEOUT_CONNECT))
        .timeout_send_request(Some(TIMEOUT_SEND_REQUEST))
        .timeout_send_body(Some(TIMEOUT_SEND_BODY))
        .timeout_recv_response(Some(TIMEOUT_RECV_RESPONSE))
        .timeout_recv_body(Some(TIMEOUT_RECV_BODY))
        .build();
    config.into()
}
