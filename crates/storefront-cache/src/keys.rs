//! Cache key generation.
//!
//! Keys have the shape `{namespace}:{kind}:v{version}:{tail}` where the tail
//! is either an entity identifier (`storefront-v1:product:v3:42`) or a
//! digest of a canonicalized parameter set
//! (`storefront-v1:search:v0:@3f1c...`). Identical semantic inputs always
//! produce byte-identical keys, regardless of parameter order or whether a
//! number arrived as `2`, `2.0` or `"2"`.

use crate::ResourceClass;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Default namespace. Bump the trailing schema version whenever the layout of
/// cached values changes so old and new deployments never share entries.
pub const DEFAULT_NAMESPACE: &str = "storefront-v1";

/// Marks a digest tail so it can never be confused with an identifier.
const DIGEST_MARKER: char = '@';

/// Prefix of the per-class version counters.
const VERSION_SEGMENT: &str = "__version";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid key segment {segment:?}: {reason}")]
    InvalidSegment {
        segment: String,
        reason: &'static str,
    },

    #[error("Invalid identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("Parameter name must not be empty")]
    EmptyParamName,

    #[error("Parameter {0:?} given more than once")]
    DuplicateParam(String),

    #[error("Parameter {0:?} is not a finite number")]
    NonFiniteNumber(String),
}

/// A fully built cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The resource kind segment, e.g. `product`.
    pub fn kind(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Primitive parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ParamValue {
    /// Canonical textual form. `None` means the value is empty and the
    /// parameter is dropped.
    fn canonical(&self, name: &str) -> Result<Option<String>, KeyError> {
        let rendered = match self {
            Self::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.to_string()
            }
            Self::Int(i) => i.to_string(),
            Self::Float(f) => {
                if !f.is_finite() {
                    return Err(KeyError::NonFiniteNumber(name.to_string()));
                }
                // 2^53: every integral float below this is exactly an i64.
                if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Self::Bool(b) => b.to_string(),
        };
        Ok(Some(rendered))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// The logical parameters of a cached read.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyParams {
    /// A single entity identifier, embedded verbatim.
    Id(String),
    /// A filter/sort/pagination set, embedded as a digest.
    Query(BTreeMap<String, ParamValue>),
}

impl KeyParams {
    pub fn id(id: impl fmt::Display) -> Self {
        Self::Id(id.to_string())
    }

    pub fn query() -> QueryParams {
        QueryParams::default()
    }

    /// Builds a parameter set from raw `name=value` pairs, e.g. a parsed
    /// query string. Repeated names are rejected rather than merged.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if map.insert(name.clone(), ParamValue::Str(value.into())).is_some() {
                return Err(KeyError::DuplicateParam(name));
            }
        }
        Ok(Self::Query(map))
    }
}

/// Builder for [`KeyParams::Query`].
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds the parameter only when a value is present.
    pub fn opt<V: Into<ParamValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn build(self) -> KeyParams {
        KeyParams::Query(self.params)
    }
}

fn validate_segment(segment: &str) -> Result<(), KeyError> {
    if segment.is_empty() {
        return Err(KeyError::InvalidSegment {
            segment: segment.to_string(),
            reason: "must not be empty",
        });
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(KeyError::InvalidSegment {
            segment: segment.to_string(),
            reason: "only ASCII letters, digits, '-' and '_' are allowed",
        });
    }
    Ok(())
}

fn validate_identifier(id: &str) -> Result<(), KeyError> {
    let malformed = id.is_empty()
        || id.starts_with(DIGEST_MARKER)
        || id
            .chars()
            .any(|c| c == ':' || c == '*' || c == '?' || c == '[' || c.is_whitespace() || c.is_control());
    if malformed {
        return Err(KeyError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}

/// Serializes the canonical parameter map and returns the first 128 bits of
/// its SHA-256 digest, hex encoded.
pub fn hash_params(params: &BTreeMap<String, ParamValue>) -> Result<String, KeyError> {
    let mut canonical = BTreeMap::new();
    for (name, value) in params {
        let name = name.trim();
        if name.is_empty() {
            return Err(KeyError::EmptyParamName);
        }
        if let Some(rendered) = value.canonical(name)? {
            if canonical.insert(name.to_string(), rendered).is_some() {
                return Err(KeyError::DuplicateParam(name.to_string()));
            }
        }
    }

    // BTreeMap serializes in key order, so the JSON is canonical.
    let json = serde_json::to_string(&canonical).unwrap_or_default();
    let digest = Sha256::digest(json.as_bytes());
    Ok(hex::encode(&digest[..16]))
}

/// Builds a key from raw parts.
pub fn build_key(
    namespace: &str,
    kind: &str,
    version: i64,
    params: &KeyParams,
) -> Result<CacheKey, KeyError> {
    validate_segment(namespace)?;
    validate_segment(kind)?;

    let tail = match params {
        KeyParams::Id(id) => {
            validate_identifier(id)?;
            id.clone()
        }
        KeyParams::Query(map) => format!("{}{}", DIGEST_MARKER, hash_params(map)?),
    };

    Ok(CacheKey(format!("{namespace}:{kind}:v{version}:{tail}")))
}

/// Key builder bound to one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    namespace: String,
}

impl KeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Result<Self, KeyError> {
        let namespace = namespace.into();
        validate_segment(&namespace)?;
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn build_key(
        &self,
        class: ResourceClass,
        version: i64,
        params: &KeyParams,
    ) -> Result<CacheKey, KeyError> {
        build_key(&self.namespace, class.kind(), version, params)
    }

    /// Store key holding the version counter of a class.
    pub fn version_key(&self, class: ResourceClass) -> String {
        format!("{}:{}:{}", self.namespace, VERSION_SEGMENT, class.kind())
    }

    /// Pattern matching every entry of a class, across all versions.
    pub fn class_pattern(&self, class: ResourceClass) -> String {
        format!("{}:{}:*", self.namespace, class.kind())
    }

    /// Pattern matching every entry in the namespace, version counters excluded.
    pub fn namespace_pattern(&self) -> String {
        format!("{}:[^_]*", self.namespace)
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}
