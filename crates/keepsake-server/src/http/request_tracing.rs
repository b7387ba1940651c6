// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::http::HeaderMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestTrace {
    pub request_id: String,
    pub correlation_id: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[must_use]
pub(crate) fn extract_request_trace(headers: &HeaderMap, state: &AppState) -> RequestTrace {
    let correlation_id = header_value(headers, "x-correlation-id");
    let request_id = header_value(headers, "x-request-id").unwrap_or_else(|| {
        let id = state
            .request_id_seed
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("req-{id:016x}")
    });

    RequestTrace {
        request_id,
        correlation_id,
    }
}
