//! Request retry with rate-limit backoff, shared by the upstream clients

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

/// Send a request, retrying rate limits (429), server errors (5xx) and
/// transport failures up to `max_retries` attempts.
///
/// When every attempt got an HTTP answer the last response is returned as-is
/// so callers can forward the upstream status. `Err` means no attempt
/// reached the server.
pub async fn send_with_retry(request: RequestBuilder, max_retries: u32) -> Result<Response, String> {
    let attempts = max_retries.max(1);
    let mut last_response = None;
    let mut last_error = None;

    for attempt in 0..attempts {
        let req = request
            .try_clone()
            .ok_or_else(|| "Failed to clone request".to_string())?;
        let is_last = attempt + 1 == attempts;

        match req.send().await {
            Ok(response) => {
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    if is_last {
                        return Ok(response);
                    }
                    let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                    tracing::warn!(
                        "Rate limited (429), backing off for {:?} (attempt {}/{})",
                        backoff,
                        attempt + 1,
                        attempts
                    );
                    last_response = Some(response);
                    tokio::time::sleep(backoff).await;
                    continue;
                }

                if status.is_server_error() && !is_last {
                    tracing::warn!("Server error {} (attempt {}/{})", status, attempt + 1, attempts);
                    last_response = Some(response);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                    continue;
                }

                return Ok(response);
            }
            Err(e) => {
                tracing::warn!("Request failed (attempt {}/{}): {}", attempt + 1, attempts, e);
                last_error = Some(e.to_string());
                if !is_last {
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }
    }

    match last_response {
        Some(response) => Ok(response),
        None => Err(last_error.unwrap_or_else(|| "Max retries exceeded".to_string())),
    }
}
