use serde_json::{Map, Value};
use tokio::time::sleep;

use crate::client::SerasaClient;
use crate::errors::{ResultExt, SerasaError};
use crate::models::{
    CreditCheckResult, CreditCheckStatus, QueryParam, ResponseBody, ResponseEnvelope,
};

impl SerasaClient {
    /// Submits a credit check and immediately polls for its result.
    ///
    /// On a 2xx response the API hands back a protocol number; the client
    /// polls it right away. The returned status is `PENDING` with the
    /// protocol number when the result is not ready yet, or `DONE` with the
    /// result attached once the poll came back with data.
    ///
    /// # Arguments
    ///
    /// * `data` - Credit-check payload, forwarded as the request body.
    /// * `params` - Extra query parameters for the submission.
    pub async fn consulta_credito(
        &self,
        data: &Map<String, Value>,
        params: &[QueryParam],
    ) -> Result<CreditCheckResult, SerasaError> {
        tracing::info!("Submitting credit check");
        let envelope = self
            .post("consultas/assincrona", data, params, &[])
            .await
            .context("credit check submission failed")?;

        if !envelope.is_success() {
            return Err(extract_api_error(&envelope)).context("credit check rejected");
        }

        let protocolo = envelope
            .body
            .as_json()
            .and_then(|body| body.get("protocolo"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| SerasaError::UnrecognizedResponse(serialize_envelope(&envelope)))
            .context("credit check accepted without a protocol number")?;
        tracing::info!("Credit check accepted, protocolo {}", protocolo);

        let mut retorno = CreditCheckResult {
            status: CreditCheckStatus::Pending,
            protocolo: protocolo.clone(),
            result: None,
        };

        if let Some(raw) = self
            .consulta_protocolo(&protocolo, &[])
            .await
            .context("credit check result poll failed")?
            .filter(|raw| !raw.is_empty())
        {
            retorno.result = Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
            retorno.status = CreditCheckStatus::Done;
        }

        Ok(retorno)
    }

    /// Polls the status of a credit check by protocol number.
    ///
    /// Returns `Ok(None)` when the API still reports the check as processing
    /// after every poll attempt; that is a normal outcome, not an error. Once
    /// the result is ready it comes back as the raw response body.
    ///
    /// # Arguments
    ///
    /// * `protocolo` - Protocol number from the submission.
    /// * `_params` - Accepted but not forwarded: the request always carries
    ///   exactly one `protocolo` query parameter.
    pub async fn consulta_protocolo(
        &self,
        protocolo: &str,
        _params: &[QueryParam],
    ) -> Result<Option<String>, SerasaError> {
        let params = vec![QueryParam::text("protocolo", protocolo)];
        let attempts = self.config().poll_attempts;
        let mut attempt = 1;

        while attempt <= attempts {
            tracing::debug!("Polling protocolo {} (attempt {})", protocolo, attempt);
            let envelope = self
                .get_raw("consultas/assincrona", &params, &[])
                .await
                .context("protocol poll failed")?;

            match envelope.http_code {
                202 => {
                    if attempt < attempts {
                        sleep(self.config().poll_delay).await;
                    }
                    attempt += 1;
                }
                200 => {
                    let raw = envelope.body.as_raw().unwrap_or_default().to_owned();
                    return Ok(Some(raw));
                }
                _ => {
                    let envelope = decode_envelope(envelope);
                    return Err(extract_api_error(&envelope)).context("protocol poll rejected");
                }
            }
        }

        tracing::info!(
            "Protocolo {} still processing after {} attempts",
            protocolo,
            attempts
        );
        Ok(None)
    }
}

/// Re-decodes an envelope whose body was fetched raw, so error shapes can be
/// inspected. Undecodable bodies become JSON null, as in a decoded fetch.
fn decode_envelope(envelope: ResponseEnvelope) -> ResponseEnvelope {
    let ResponseEnvelope {
        body,
        http_code,
        info,
    } = envelope;

    let body = match body {
        ResponseBody::Raw(raw) => {
            ResponseBody::Json(serde_json::from_str(&raw).unwrap_or(Value::Null))
        }
        decoded => decoded,
    };

    ResponseEnvelope {
        body,
        http_code,
        info,
    }
}

/// Maps a non-success envelope to an error: a `message` field wins, then the
/// `errors[]` array with messages joined by CRLF, then a generic dump of the
/// whole envelope.
fn extract_api_error(envelope: &ResponseEnvelope) -> SerasaError {
    if let Some(body) = envelope.body.as_json() {
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return SerasaError::Api(message.to_owned());
        }

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|error| error.get("message").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return SerasaError::Api(messages.join("\r\n"));
            }
        }
    }

    SerasaError::UnrecognizedResponse(serialize_envelope(envelope))
}

fn serialize_envelope(envelope: &ResponseEnvelope) -> String {
    serde_json::to_string(envelope).unwrap_or_else(|_| format!("HTTP {}", envelope.http_code))
}
