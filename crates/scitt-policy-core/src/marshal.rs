//! Header Marshaler: projects a protected header into policy input.
//!
//! Two projections exist, one per backend:
//! - Scripting: the full header, with `x5chain` re-encoded as PEM text.
//! - Declarative: the documented subset `profile`, `phdr.alg`, `phdr.cty`
//!   and `phdr.cwt`.
//!
//! Absent optional fields are omitted, never written as `null`, so policies
//! can rely on native existence checks. The projection is one-way.

use pem::{EncodeConfig, LineEnding, Pem};
use serde_json::{Map, Value};

use crate::header::{ClaimProfile, ContentType, CwtClaims, Label, ProtectedHeader};

const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Backend a projection is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Scripting,
    Declarative,
}

impl Target {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Scripting => "scripting",
            Target::Declarative => "declarative",
        }
    }
}

/// Language-neutral policy input.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeInput {
    target: Target,
    profile: ClaimProfile,
    phdr: Value,
}

impl NativeInput {
    pub fn target(&self) -> Target {
        self.target
    }

    pub fn profile(&self) -> ClaimProfile {
        self.profile
    }

    /// Header projection (always a JSON object).
    pub fn phdr(&self) -> &Value {
        &self.phdr
    }

    /// Single input document for query-style backends:
    /// `{"profile": ..., "phdr": {...}}`.
    pub fn to_query_input(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("profile".into(), Value::from(self.profile.as_str()));
        doc.insert("phdr".into(), self.phdr.clone());
        Value::Object(doc)
    }
}

/// Marshal `header` for the given backend.
pub fn marshal(profile: ClaimProfile, header: &ProtectedHeader, target: Target) -> NativeInput {
    let phdr = match target {
        Target::Scripting => scripting_projection(header),
        Target::Declarative => declarative_projection(header),
    };
    NativeInput {
        target,
        profile,
        phdr: Value::Object(phdr),
    }
}

fn scripting_projection(h: &ProtectedHeader) -> Map<String, Value> {
    let mut obj = Map::new();

    put(&mut obj, "alg", h.alg.map(Value::from));
    put(
        &mut obj,
        "crit",
        h.crit
            .as_ref()
            .map(|labels| Value::Array(labels.iter().map(label_value).collect())),
    );
    put(&mut obj, "kid", h.kid.as_deref().map(Value::from));
    put(&mut obj, "issuer", h.issuer.as_deref().map(Value::from));
    put(&mut obj, "feed", h.feed.as_deref().map(Value::from));
    put(&mut obj, "iat", h.iat.map(Value::from));
    put(&mut obj, "svn", h.svn.map(Value::from));
    put(&mut obj, "cty", h.cty.as_ref().map(content_type_value));
    put(
        &mut obj,
        "x5chain",
        h.x5chain.as_ref().map(|chain| {
            Value::Array(chain.iter().map(|der| Value::from(der_to_pem(der))).collect())
        }),
    );
    obj.insert("cwt".into(), Value::Object(cwt_projection(&h.cwt_claims)));

    obj
}

fn declarative_projection(h: &ProtectedHeader) -> Map<String, Value> {
    let mut obj = Map::new();

    put(&mut obj, "alg", h.alg.map(Value::from));
    put(&mut obj, "cty", h.cty.as_ref().map(content_type_value));
    obj.insert("cwt".into(), Value::Object(cwt_projection(&h.cwt_claims)));

    obj
}

fn cwt_projection(c: &CwtClaims) -> Map<String, Value> {
    let mut cwt = Map::new();
    put(&mut cwt, "iss", c.iss.as_deref().map(Value::from));
    put(&mut cwt, "sub", c.sub.as_deref().map(Value::from));
    put(&mut cwt, "iat", c.iat.map(Value::from));
    put(&mut cwt, "svn", c.svn.map(Value::from));
    cwt
}

fn put(obj: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        obj.insert(key.to_string(), v);
    }
}

fn label_value(label: &Label) -> Value {
    match label {
        Label::Int(i) => Value::from(*i),
        Label::Text(s) => Value::from(s.as_str()),
    }
}

fn content_type_value(cty: &ContentType) -> Value {
    match cty {
        ContentType::Int(i) => Value::from(*i),
        ContentType::Text(s) => Value::from(s.as_str()),
    }
}

/// PEM-armor a DER certificate (LF line endings, 64-column body).
pub fn der_to_pem(der: &[u8]) -> String {
    let block = Pem::new(PEM_CERTIFICATE_TAG, der.to_vec());
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}
