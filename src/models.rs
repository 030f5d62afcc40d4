use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single query-string parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    pub name: String,
    pub value: ParamValue,
}

/// Query parameter values are either text or numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(i64),
}

impl QueryParam {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::Text(value.into()),
        }
    }

    pub fn number(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::Number(value),
        }
    }

    /// Whether this parameter makes it onto the query string: the name must
    /// be non-empty and the value non-empty text or any number. Numeric zero
    /// is a valid value, an empty string is not.
    pub fn is_sent(&self) -> bool {
        if self.name.is_empty() {
            return false;
        }
        match &self.value {
            ParamValue::Text(text) => !text.is_empty(),
            ParamValue::Number(_) => true,
        }
    }

    /// The value as it appears on the query string.
    pub fn value_string(&self) -> String {
        match &self.value {
            ParamValue::Text(text) => text.clone(),
            ParamValue::Number(number) => number.to_string(),
        }
    }
}

/// Response body, decoded or raw depending on the decode flag in effect for
/// the request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            ResponseBody::Raw(raw) => Some(raw),
            ResponseBody::Json(_) => None,
        }
    }
}

/// Transport diagnostics attached to responses when debug is enabled.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransportInfo {
    pub url: String,
    pub method: String,
    pub elapsed_ms: u128,
}

/// What a single API call returned. Created fresh per call and handed to the
/// caller; non-2xx statuses are reported here, not as errors.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub body: ResponseBody,
    pub http_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<TransportInfo>,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.http_code)
    }
}

/// Lifecycle of an asynchronous credit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditCheckStatus {
    Pending,
    Done,
}

/// Outcome of a credit-check submission. `result` is present once the
/// protocol poll returned the check's data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditCheckResult {
    pub status: CreditCheckStatus,
    pub protocolo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}
