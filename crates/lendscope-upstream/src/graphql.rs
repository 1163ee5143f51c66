use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlErrorEntry {
    pub message: String,
}
