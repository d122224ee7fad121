//! `[rpc_endpoints]` overrides and `${ENV_VAR}` interpolation of their urls.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, env::VarError, fmt, sync::LazyLock};

/// Matches a `${VAR}` placeholder, whitespace inside the braces is ignored.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\s*(?P<var>[^}]*?)\s*\}").unwrap());

/// An endpoint referenced an environment variable that is not set.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to resolve env var `{var}` in `{url}`: {source}")]
pub struct UnresolvedEnvVarError {
    pub url: String,
    pub var: String,
    pub source: VarError,
}

/// The `[rpc_endpoints]` table: urls keyed by chain id (`"10143"`) or alias (`"monad"`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcEndpoints(BTreeMap<String, RpcEndpointUrl>);

impl RpcEndpoints {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            entries.into_iter().map(|(key, url)| (key.into(), RpcEndpointUrl(url.into()))).collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The endpoint under the first of `keys` that has one.
    pub fn find<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Option<&RpcEndpointUrl> {
        keys.into_iter().find_map(|key| self.0.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RpcEndpointUrl)> {
        self.0.iter().map(|(key, url)| (key.as_str(), url))
    }
}

/// An endpoint url as written in the config, placeholders included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcEndpointUrl(String);

impl RpcEndpointUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_placeholders(&self) -> bool {
        PLACEHOLDER.is_match(&self.0)
    }

    /// Substitutes every `${VAR}` with the value of the environment variable.
    pub fn resolve(&self) -> Result<String, UnresolvedEnvVarError> {
        let mut missing = None;
        let url = PLACEHOLDER.replace_all(&self.0, |caps: &Captures<'_>| {
            let var = &caps["var"];
            std::env::var(var).unwrap_or_else(|source| {
                missing.get_or_insert_with(|| (var.to_string(), source));
                String::new()
            })
        });
        match missing {
            Some((var, source)) => Err(UnresolvedEnvVarError { url: self.0.clone(), var, source }),
            None => Ok(url.into_owned()),
        }
    }
}

impl fmt::Display for RpcEndpointUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
