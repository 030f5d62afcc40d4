//! Serasa negativação API Client Library
//!
//! This library provides a client for the Serasa negativação credit-check
//! API: configuration and credentials, authenticated request building, a
//! generic request executor, and the two business operations: submitting a
//! credit check and polling its asynchronous result by protocol number.
//!
//! # Modules
//!
//! - `client`: HTTP client and generic request executor.
//! - `config`: Configuration and environment selection.
//! - `consultas`: Credit-check submission and protocol polling.
//! - `errors`: Error handling types.
//! - `form_data`: Upload-mode body flattening.
//! - `models`: Request/response data model.
//!
//! # Example
//!
//! ```no_run
//! use rust_serasa_api::{Config, SerasaClient};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), rust_serasa_api::SerasaError> {
//! let config = Config::new()
//!     .with_cnpj_sh("11222333000144")
//!     .with_token_sh("token")
//!     .with_cnpj_usuario("55666777000188")
//!     .with_login("login")
//!     .with_password("password");
//! let client = SerasaClient::new(config)?;
//!
//! let data = json!({"documento": "55666777000188"});
//! let resultado = client
//!     .consulta_credito(data.as_object().unwrap(), &[])
//!     .await?;
//! println!("{:?} {}", resultado.status, resultado.protocolo);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod consultas;
pub mod errors;
pub mod form_data;
pub mod models;

pub use client::SerasaClient;
pub use config::{Config, Environment};
pub use errors::{ResultExt, SerasaError};
pub use models::{
    CreditCheckResult, CreditCheckStatus, ParamValue, QueryParam, ResponseBody, ResponseEnvelope,
    TransportInfo,
};
