//! Entrypoint stage carrier: the raw HTTP request.

use super::{body, MutationError, MutationKind, PayloadMutation, StagePayload};
use crate::stage::Stage;
use http::header::{HeaderName, HeaderValue};
use http::uri::{PathAndQuery, Uri};
use serde_json::Value;

/// The mutable view of the incoming HTTP request.
///
/// The executor builds this from the request before the stage runs and
/// writes headers and URI back afterwards; the body is returned to the
/// caller separately.
#[derive(Debug, Clone)]
pub struct EntrypointPayload {
    /// Request headers.
    pub headers: http::HeaderMap,

    /// Request URI, including the query string.
    pub uri: Uri,

    /// Raw request body bytes.
    pub body: Vec<u8>,
}

/// Mutations legal at the entrypoint stage.
#[derive(Debug, Clone, PartialEq)]
pub enum EntrypointMutation {
    /// Set or overwrite a request header.
    SetHeader { name: String, value: String },

    /// Remove a request header.
    DeleteHeader { name: String },

    /// Set or overwrite a query parameter.
    SetQueryParam { name: String, value: String },

    /// Remove a query parameter.
    DeleteQueryParam { name: String },

    /// Set a key in the JSON body (dot-separated path).
    SetBodyKey { key: String, value: Value },

    /// Remove a key from the JSON body (dot-separated path).
    DeleteBodyKey { key: String },
}

impl PayloadMutation for EntrypointMutation {
    fn kind(&self) -> MutationKind {
        match self {
            EntrypointMutation::SetHeader { .. }
            | EntrypointMutation::SetQueryParam { .. }
            | EntrypointMutation::SetBodyKey { .. } => MutationKind::Update,
            EntrypointMutation::DeleteHeader { .. }
            | EntrypointMutation::DeleteQueryParam { .. }
            | EntrypointMutation::DeleteBodyKey { .. } => MutationKind::Delete,
        }
    }

    fn key(&self) -> String {
        match self {
            EntrypointMutation::SetHeader { name, .. }
            | EntrypointMutation::DeleteHeader { name } => format!("header.{name}"),
            EntrypointMutation::SetQueryParam { name, .. }
            | EntrypointMutation::DeleteQueryParam { name } => format!("param.{name}"),
            EntrypointMutation::SetBodyKey { key, .. }
            | EntrypointMutation::DeleteBodyKey { key } => format!("body.{key}"),
        }
    }
}

impl StagePayload for EntrypointPayload {
    type Mutation = EntrypointMutation;

    const STAGE: Stage = Stage::Entrypoint;

    fn apply(&mut self, mutation: &EntrypointMutation) -> Result<(), MutationError> {
        match mutation {
            EntrypointMutation::SetHeader { name, value } => {
                let name = HeaderName::try_from(name.as_str())
                    .map_err(|e| MutationError::InvalidValue(e.to_string()))?;
                let value = HeaderValue::try_from(value.as_str())
                    .map_err(|e| MutationError::InvalidValue(e.to_string()))?;
                self.headers.insert(name, value);
                Ok(())
            }
            EntrypointMutation::DeleteHeader { name } => self
                .headers
                .remove(name.as_str())
                .map(|_| ())
                .ok_or(MutationError::KeyNotFound),
            EntrypointMutation::SetQueryParam { name, value } => {
                let mut pairs = query_pairs(&self.uri);
                match pairs.iter_mut().find(|(k, _)| k == name) {
                    Some(pair) => pair.1 = value.clone(),
                    None => pairs.push((name.clone(), value.clone())),
                }
                self.uri = with_query(&self.uri, &pairs)?;
                Ok(())
            }
            EntrypointMutation::DeleteQueryParam { name } => {
                let mut pairs = query_pairs(&self.uri);
                let before = pairs.len();
                pairs.retain(|(k, _)| k != name);
                if pairs.len() == before {
                    return Err(MutationError::KeyNotFound);
                }
                self.uri = with_query(&self.uri, &pairs)?;
                Ok(())
            }
            EntrypointMutation::SetBodyKey { key, value } => {
                self.body = body::set_key(&self.body, key, value)?;
                Ok(())
            }
            EntrypointMutation::DeleteBodyKey { key } => {
                self.body = body::delete_key(&self.body, key)?;
                Ok(())
            }
        }
    }
}

fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn with_query(uri: &Uri, pairs: &[(String, String)]) -> Result<Uri, MutationError> {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        path_and_query
            .parse::<PathAndQuery>()
            .map_err(|e| MutationError::InvalidValue(e.to_string()))?,
    );
    Uri::from_parts(parts).map_err(|e| MutationError::InvalidValue(e.to_string()))
}
