use crate::import::{self, Row};
use crate::ipc::error::{err, ok};
use crate::store::StoreError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr::new("bad_params", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HandlerErr::new("not_found", message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

pub fn respond(id: &str, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        v @ Value::Number(_) => import::roll_text(v),
        _ => None,
    }
}

/// Accepts a JSON integer or a numeric string.
pub fn get_required_i64(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    let parsed = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer", key)))
}

pub fn get_optional_i64(params: &Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => get_required_i64(params, key).map(Some),
    }
}

/// Year filter as given by the client; `"All"` and friends are resolved by
/// `roster::year_scope`.
pub fn get_year(params: &Value) -> Option<String> {
    get_optional_str(params, "year")
}

pub fn parse_param<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    serde_json::from_value(v.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

pub fn parse_params<T: DeserializeOwned>(params: &Value) -> Result<T, HandlerErr> {
    serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid params: {}", e)))
}

pub fn parse_enum<T>(params: &Value, key: &str) -> Result<T, HandlerErr>
where
    T: std::str::FromStr<Err = String>,
{
    get_required_str(params, key)?
        .parse::<T>()
        .map_err(HandlerErr::bad_params)
}

/// Import rows come either inline (`rows`) or from a CSV file (`path`).
pub fn import_rows(params: &Value) -> Result<Vec<Row>, HandlerErr> {
    if let Some(rows) = params.get("rows") {
        return import::rows_from_json(rows)
            .ok_or_else(|| HandlerErr::bad_params("rows must be an array of objects"));
    }
    let Some(path) = get_optional_str(params, "path") else {
        return Err(HandlerErr::bad_params("missing rows or path"));
    };
    import::read_csv_rows(&PathBuf::from(&path)).map_err(|e| {
        HandlerErr::new("import_failed", format!("{e:?}")).with_details(serde_json::json!({
            "path": path,
        }))
    })
}

pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
