use std::time::{Duration, Instant};

use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::config::Config;
use crate::errors::SerasaError;
use crate::form_data::{convert_to_form_data, form_value_string};
use crate::models::{QueryParam, ResponseBody, ResponseEnvelope, TransportInfo};

/// Client for the Serasa negativação API.
///
/// Holds the HTTP client and the configuration; every call builds its own
/// request from them and returns a fresh [`ResponseEnvelope`]. Non-2xx
/// statuses are reported in the envelope, not as errors.
#[derive(Debug, Clone)]
pub struct SerasaClient {
    http: reqwest::Client,
    config: Config,
}

/// Request body as assembled by the verb helpers.
enum Payload<'a> {
    Json(&'a Map<String, Value>),
    Upload(&'a Map<String, Value>),
}

/// Transport options for a single request.
struct TransportOptions<'a> {
    method: Method,
    headers: Vec<(String, String)>,
    body: Option<Payload<'a>>,
    decode: bool,
}

impl SerasaClient {
    /// Creates a new `SerasaClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Credentials, environment and behavior flags.
    pub fn new(config: Config) -> Result<Self, SerasaError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SerasaError::Transport(format!("Failed to create Serasa client: {}", e))
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Default headers sent on every authenticated call, in order: `Accept`,
    /// the four credential headers, and a `Content-Type` that depends on
    /// upload mode.
    pub fn default_headers(&self) -> Vec<(String, String)> {
        let content_type = if self.config.upload {
            "multipart/form-data"
        } else {
            "application/json"
        };

        vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("cnpjSH".to_string(), self.config.cnpj_sh.clone()),
            ("tokenSH".to_string(), self.config.token_sh.clone()),
            ("cnpjUsuario".to_string(), self.config.cnpj_usuario.clone()),
            ("login".to_string(), self.config.login.clone()),
            ("password".to_string(), self.config.password.clone()),
            ("Content-Type".to_string(), content_type.to_string()),
        ]
    }

    /// Default headers with caller extras appended after them. Extras are
    /// never merged or deduplicated against the defaults.
    fn headers_with(&self, extra: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers = self.default_headers();
        headers.extend(extra.iter().cloned());
        headers
    }

    /// Executes a GET request.
    pub async fn get(
        &self,
        path: &str,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        self.execute(
            path,
            TransportOptions {
                method: Method::GET,
                headers: self.headers_with(headers),
                body: None,
                decode: self.config.decode,
            },
            params,
        )
        .await
    }

    /// As [`get`](Self::get), but the body comes back raw regardless of the
    /// configured decode flag. The protocol poll uses this, so the shared
    /// configuration is never mutated mid-call.
    pub async fn get_raw(
        &self,
        path: &str,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        self.execute(
            path,
            TransportOptions {
                method: Method::GET,
                headers: self.headers_with(headers),
                body: None,
                decode: false,
            },
            params,
        )
        .await
    }

    /// Executes a POST request. In upload mode the body map is flattened into
    /// multipart form fields; otherwise it is JSON-encoded.
    pub async fn post(
        &self,
        path: &str,
        body: &Map<String, Value>,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        let payload = if self.config.upload {
            Payload::Upload(body)
        } else {
            Payload::Json(body)
        };

        self.execute(
            path,
            TransportOptions {
                method: Method::POST,
                headers: self.headers_with(headers),
                body: Some(payload),
                decode: self.config.decode,
            },
            params,
        )
        .await
    }

    /// Executes a PUT request. PUT bodies are always JSON; upload mode
    /// applies to POST only.
    pub async fn put(
        &self,
        path: &str,
        body: &Map<String, Value>,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        self.execute(
            path,
            TransportOptions {
                method: Method::PUT,
                headers: self.headers_with(headers),
                body: Some(Payload::Json(body)),
                decode: self.config.decode,
            },
            params,
        )
        .await
    }

    /// Executes a PATCH request. PATCH bodies are always JSON; upload mode
    /// applies to POST only.
    pub async fn patch(
        &self,
        path: &str,
        body: &Map<String, Value>,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        self.execute(
            path,
            TransportOptions {
                method: Method::PATCH,
                headers: self.headers_with(headers),
                body: Some(Payload::Json(body)),
                decode: self.config.decode,
            },
            params,
        )
        .await
    }

    /// Executes a DELETE request.
    pub async fn delete(
        &self,
        path: &str,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        self.execute(
            path,
            TransportOptions {
                method: Method::DELETE,
                headers: self.headers_with(headers),
                body: None,
                decode: self.config.decode,
            },
            params,
        )
        .await
    }

    /// Executes an OPTIONS request. OPTIONS carries only caller-supplied
    /// headers, no credential defaults.
    pub async fn options(
        &self,
        path: &str,
        params: &[QueryParam],
        headers: &[(String, String)],
    ) -> Result<ResponseEnvelope, SerasaError> {
        self.execute(
            path,
            TransportOptions {
                method: Method::OPTIONS,
                headers: headers.to_vec(),
                body: None,
                decode: self.config.decode,
            },
            params,
        )
        .await
    }

    /// Resolves the full request URL: base URL for the configured
    /// environment (or the override), the path normalized to a leading `/`,
    /// and the query string built from the params that pass the filter.
    fn build_url(&self, path: &str, params: &[QueryParam]) -> Result<Url, SerasaError> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let full = format!("{}{}", self.config.resolved_base_url(), path);
        let mut url = Url::parse(&full)
            .map_err(|e| SerasaError::Transport(format!("invalid request URL {}: {}", full, e)))?;

        let sent: Vec<&QueryParam> = params.iter().filter(|p| p.is_sent()).collect();
        if !sent.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for param in sent {
                pairs.append_pair(&param.name, &param.value_string());
            }
        }

        Ok(url)
    }

    /// Performs the HTTP call and packages the response into an envelope.
    async fn execute(
        &self,
        path: &str,
        opts: TransportOptions<'_>,
        params: &[QueryParam],
    ) -> Result<ResponseEnvelope, SerasaError> {
        let url = self.build_url(path, params)?;
        tracing::debug!("{} {}", opts.method, url);

        let started = Instant::now();
        let is_multipart = matches!(opts.body, Some(Payload::Upload(_)));

        let mut request = self.http.request(opts.method.clone(), url.clone());
        for (name, value) in &opts.headers {
            // the multipart content type (with boundary) comes from the form
            if is_multipart && name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        match opts.body {
            Some(Payload::Json(body)) => {
                let encoded = serde_json::to_string(body).map_err(|e| {
                    SerasaError::Transport(format!("failed to encode request body: {}", e))
                })?;
                request = request.body(encoded);
            }
            Some(Payload::Upload(body)) => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in convert_to_form_data(body) {
                    form = form.text(name, form_value_string(&value));
                }
                request = request.multipart(form);
            }
            None => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| SerasaError::Transport(format!("request to {} failed: {}", url, e)))?;

        let http_code = response.status().as_u16();
        let raw = response.text().await.map_err(|e| {
            SerasaError::Transport(format!("failed to read response from {}: {}", url, e))
        })?;
        let elapsed_ms = started.elapsed().as_millis();

        tracing::debug!("{} {} -> {} in {}ms", opts.method, url, http_code, elapsed_ms);

        let body = if opts.decode {
            // undecodable bodies decode to null rather than failing the call
            ResponseBody::Json(serde_json::from_str(&raw).unwrap_or(Value::Null))
        } else {
            ResponseBody::Raw(raw)
        };

        let info = self.config.debug.then(|| TransportInfo {
            url: url.to_string(),
            method: opts.method.to_string(),
            elapsed_ms,
        });

        Ok(ResponseEnvelope {
            body,
            http_code,
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn client(config: Config) -> SerasaClient {
        SerasaClient::new(config).unwrap()
    }

    #[test]
    fn default_headers_reflect_configuration_verbatim() {
        let client = client(
            Config::new()
                .with_cnpj_sh("11222333000144")
                .with_token_sh("tok-sh")
                .with_cnpj_usuario("55666777000188")
                .with_login("user")
                .with_password("secret"),
        );

        let headers = client.default_headers();
        assert_eq!(
            headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("cnpjSH".to_string(), "11222333000144".to_string()),
                ("tokenSH".to_string(), "tok-sh".to_string()),
                ("cnpjUsuario".to_string(), "55666777000188".to_string()),
                ("login".to_string(), "user".to_string()),
                ("password".to_string(), "secret".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn content_type_follows_upload_mode() {
        let json_client = client(Config::new());
        assert_eq!(
            json_client.default_headers().last().unwrap().1,
            "application/json"
        );

        let upload_client = client(Config::new().with_upload(true));
        assert_eq!(
            upload_client.default_headers().last().unwrap().1,
            "multipart/form-data"
        );
    }

    #[test]
    fn extra_headers_are_appended_not_merged() {
        let client = client(Config::new());
        let headers = client.headers_with(&[(
            "Content-Type".to_string(),
            "application/xml".to_string(),
        )]);

        let content_types: Vec<&str> = headers
            .iter()
            .filter(|(name, _)| name == "Content-Type")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(content_types, vec!["application/json", "application/xml"]);
    }

    #[test]
    fn query_string_keeps_zero_and_drops_empty_entries() {
        let client = client(Config::new());
        let params = vec![
            QueryParam::number("a", 0),
            QueryParam::text("b", ""),
            QueryParam::text("", "x"),
        ];

        let url = client.build_url("consultas/assincrona", &params).unwrap();
        assert_eq!(url.query(), Some("a=0"));
    }

    #[test]
    fn no_query_string_when_every_param_is_filtered_out() {
        let client = client(Config::new());
        let params = vec![QueryParam::text("b", ""), QueryParam::text("", "x")];

        let url = client.build_url("consultas/assincrona", &params).unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(
            url.as_str(),
            "https://api.consultanegativacao.com.br/v1/consultas/assincrona"
        );
    }

    #[test]
    fn path_gets_a_leading_slash_and_environment_picks_the_host() {
        let production = client(Config::new());
        let url = production.build_url("consultas/assincrona", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.consultanegativacao.com.br/v1/consultas/assincrona"
        );

        let sandbox = client(Config::new().with_environment(Environment::Sandbox));
        let url = sandbox.build_url("/consultas/assincrona", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.consultanegativacao.com.br/v1/homologacao/consultas/assincrona"
        );
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let client = client(Config::new());
        let params = vec![QueryParam::text("q", "João & filhos")];

        let url = client.build_url("consultas", &params).unwrap();
        assert_eq!(url.query(), Some("q=Jo%C3%A3o+%26+filhos"));
    }
}
