//! Decoded protected-header metadata of a signed statement.
//!
//! Values arrive already parsed from COSE/CWT by the caller. Every field is
//! optional and absence is preserved all the way into the policy input.

use std::fmt;

use bytes::Bytes;

/// Signing-convention family a statement follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimProfile {
    Ietf,
    X509,
}

impl ClaimProfile {
    /// Tag passed to policies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimProfile::Ietf => "IETF",
            ClaimProfile::X509 => "X509",
        }
    }
}

impl fmt::Display for ClaimProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// COSE label: integer or text. Used for `crit` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Int(i64),
    Text(String),
}

/// Content type: CoAP content-format integer or media-type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Int(i64),
    Text(String),
}

/// Claims carried in the CWT claims header parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CwtClaims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub iat: Option<i64>,
    pub svn: Option<i64>,
}

/// Protected header of a signed statement (read-only during evaluation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedHeader {
    pub alg: Option<i64>,
    pub crit: Option<Vec<Label>>,
    pub kid: Option<String>,
    pub issuer: Option<String>,
    pub feed: Option<String>,
    /// Issued-at, seconds since the epoch.
    pub iat: Option<i64>,
    /// Software version number.
    pub svn: Option<i64>,
    pub cty: Option<ContentType>,
    /// DER-encoded certificates, leaf first.
    pub x5chain: Option<Vec<Bytes>>,
    pub cwt_claims: CwtClaims,
}
