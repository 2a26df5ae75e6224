use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Body of `PUT /storage/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PutValueRequest {
    pub value: String,
}

/// Response of `GET` and `PUT /storage/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoredValue {
    pub key: String,
    pub value: String,
    pub shared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
