//! Status-code to `ClientError` mapping shared by both HTTP clients.

use crate::ClientError;

/// Decode a JSON body, converting non-success statuses to errors.
pub(crate) async fn handle_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let snippet: String = body.chars().take(256).collect();
        ClientError::InvalidResponse(format!("decoding body: {e} - body: {snippet}"))
    })
}

/// Extract error information from a failed response.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let retry_after = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = resp.text().await.unwrap_or_default();
    let body_snippet: String = body.chars().take(256).collect();

    match status {
        429 => {
            tracing::warn!("rate limit hit (429), retry-after: {:?}", retry_after);
            ClientError::RateLimited { retry_after }
        }
        401 | 403 => ClientError::Auth(body_snippet),
        404 => ClientError::NotFound(body_snippet),
        400 | 422 => ClientError::InvalidInput(body_snippet),
        _ => ClientError::from_status(status, body_snippet),
    }
}
