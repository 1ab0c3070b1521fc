//! JSON test vector loader shared by marshaling tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use bytes::Bytes;
use serde::Deserialize;

use scitt_policy_core::{ClaimProfile, ContentType, CwtClaims, Label, ProtectedHeader};

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub profile: String,
    pub header: HeaderData,
    pub expect: ExpectBlock,
}

#[derive(Debug, Deserialize)]
pub struct ExpectBlock {
    pub scripting: serde_json::Value,
    pub declarative: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IntOrText {
    Int(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CwtData {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub iat: Option<i64>,
    pub svn: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderData {
    pub alg: Option<i64>,
    pub crit: Option<Vec<IntOrText>>,
    pub kid: Option<String>,
    pub issuer: Option<String>,
    pub feed: Option<String>,
    pub iat: Option<i64>,
    pub svn: Option<i64>,
    pub cty: Option<IntOrText>,
    /// Hex-encoded DER certificates.
    pub x5chain: Option<Vec<String>>,
    #[serde(default)]
    pub cwt: CwtData,
}

impl TestVector {
    pub fn profile(&self) -> ClaimProfile {
        match self.profile.as_str() {
            "IETF" => ClaimProfile::Ietf,
            "X509" => ClaimProfile::X509,
            other => panic!("unsupported profile: {other}"),
        }
    }
}

impl HeaderData {
    pub fn build(&self) -> ProtectedHeader {
        ProtectedHeader {
            alg: self.alg,
            crit: self.crit.as_ref().map(|labels| {
                labels
                    .iter()
                    .map(|l| match l {
                        IntOrText::Int(i) => Label::Int(*i),
                        IntOrText::Text(s) => Label::Text(s.clone()),
                    })
                    .collect()
            }),
            kid: self.kid.clone(),
            issuer: self.issuer.clone(),
            feed: self.feed.clone(),
            iat: self.iat,
            svn: self.svn,
            cty: self.cty.as_ref().map(|c| match c {
                IntOrText::Int(i) => ContentType::Int(*i),
                IntOrText::Text(s) => ContentType::Text(s.clone()),
            }),
            x5chain: self.x5chain.as_ref().map(|chain| {
                chain
                    .iter()
                    .map(|h| Bytes::from(hex::decode(h).expect("invalid hex in test vector")))
                    .collect()
            }),
            cwt_claims: CwtClaims {
                iss: self.cwt.iss.clone(),
                sub: self.cwt.sub.clone(),
                iat: self.cwt.iat,
                svn: self.cwt.svn,
            },
        }
    }
}

pub fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
