use std::time::Duration;

/// API environment selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    /// Resolves an environment from its numeric code (1 - production, 2 - sandbox).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Environment::Production),
            2 => Some(Environment::Sandbox),
            _ => None,
        }
    }

    /// Numeric code of this environment.
    pub fn code(&self) -> u8 {
        match self {
            Environment::Production => 1,
            Environment::Sandbox => 2,
        }
    }

    /// Base URL of the API host for this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.consultanegativacao.com.br/v1",
            Environment::Sandbox => "https://api.consultanegativacao.com.br/v1/homologacao",
        }
    }
}

/// Client configuration: credentials, environment and behavior flags.
#[derive(Debug, Clone)]
pub struct Config {
    /// CNPJ of the software house issuing requests.
    pub cnpj_sh: String,
    /// API token of the software house.
    pub token_sh: String,
    /// CNPJ of the end user the requests are issued for.
    pub cnpj_usuario: String,
    pub login: String,
    pub password: String,
    pub environment: Environment,
    /// Attach transport diagnostics to every response envelope.
    pub debug: bool,
    /// Send POST bodies as multipart form fields instead of JSON.
    pub upload: bool,
    /// Decode response bodies as JSON.
    pub decode: bool,
    /// Overrides the environment base URL when set. Used to point the client
    /// at a mock server in tests or at a proxy.
    pub base_url: Option<String>,
    /// How many times the protocol poll asks for a result before reporting
    /// the check as still pending.
    pub poll_attempts: u32,
    /// Delay between protocol poll attempts.
    pub poll_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cnpj_sh: String::new(),
            token_sh: String::new(),
            cnpj_usuario: String::new(),
            login: String::new(),
            password: String::new(),
            environment: Environment::Production,
            debug: false,
            upload: false,
            decode: true,
            base_url: None,
            poll_attempts: 2,
            poll_delay: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the configuration from environment variables.
    ///
    /// Required: `SERASA_CNPJ_SH`, `SERASA_TOKEN_SH`, `SERASA_CNPJ_USUARIO`,
    /// `SERASA_LOGIN`, `SERASA_PASSWORD`. Optional: `SERASA_ENVIRONMENT`
    /// (1 - production, 2 - sandbox, defaults to production) and
    /// `SERASA_BASE_URL` (overrides the environment host).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            cnpj_sh: require_env("SERASA_CNPJ_SH")?,
            token_sh: require_env("SERASA_TOKEN_SH")?,
            cnpj_usuario: require_env("SERASA_CNPJ_USUARIO")?,
            login: require_env("SERASA_LOGIN")?,
            password: require_env("SERASA_PASSWORD")?,
            environment: match std::env::var("SERASA_ENVIRONMENT") {
                Ok(raw) => raw
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(Environment::from_code)
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "SERASA_ENVIRONMENT must be 1 (production) or 2 (sandbox)"
                        )
                    })?,
                Err(_) => Environment::Production,
            },
            base_url: std::env::var("SERASA_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SERASA_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?,
            ..Self::default()
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Environment: {:?}", config.environment);
        if let Some(ref base_url) = config.base_url {
            tracing::debug!("Base URL override: {}", base_url);
        }

        Ok(config)
    }

    /// Selects the environment from its numeric code (1 - production,
    /// 2 - sandbox). Unknown codes leave the current environment unchanged.
    pub fn set_environment(&mut self, code: u8) {
        if let Some(environment) = Environment::from_code(code) {
            self.environment = environment;
        }
    }

    pub fn with_cnpj_sh(mut self, cnpj: impl Into<String>) -> Self {
        self.cnpj_sh = cnpj.into();
        self
    }

    pub fn with_token_sh(mut self, token: impl Into<String>) -> Self {
        self.token_sh = token.into();
        self
    }

    pub fn with_cnpj_usuario(mut self, cnpj: impl Into<String>) -> Self {
        self.cnpj_usuario = cnpj.into();
        self
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = login.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_upload(mut self, upload: bool) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_decode(mut self, decode: bool) -> Self {
        self.decode = decode;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_poll_attempts(mut self, attempts: u32) -> Self {
        self.poll_attempts = attempts;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Base URL requests are issued against: the override when set, the
    /// environment host otherwise.
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

fn require_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fresh_client_state() {
        let config = Config::default();
        assert_eq!(config.cnpj_sh, "");
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.debug);
        assert!(!config.upload);
        assert!(config.decode);
        assert_eq!(config.poll_attempts, 2);
        assert_eq!(config.poll_delay, Duration::from_secs(5));
    }

    #[test]
    fn environment_codes_map_to_hosts() {
        assert_eq!(Environment::from_code(1), Some(Environment::Production));
        assert_eq!(Environment::from_code(2), Some(Environment::Sandbox));
        assert_eq!(Environment::from_code(0), None);
        assert_eq!(Environment::from_code(3), None);

        assert_eq!(
            Environment::Production.base_url(),
            "https://api.consultanegativacao.com.br/v1"
        );
        assert_eq!(
            Environment::Sandbox.base_url(),
            "https://api.consultanegativacao.com.br/v1/homologacao"
        );
    }

    #[test]
    fn invalid_environment_code_is_ignored() {
        let mut config = Config::default().with_environment(Environment::Sandbox);
        config.set_environment(7);
        assert_eq!(config.environment, Environment::Sandbox);

        config.set_environment(1);
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn base_url_override_wins_over_environment() {
        let config = Config::default();
        assert_eq!(
            config.resolved_base_url(),
            "https://api.consultanegativacao.com.br/v1"
        );

        let config = config.with_base_url("http://localhost:8080");
        assert_eq!(config.resolved_base_url(), "http://localhost:8080");
    }
}
