// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the PrintRelay print server.

use std::fmt;
use std::net::IpAddr;
use std::num::NonZeroU32;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier attached to a job for log correlation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Duplex printing mode.
///
/// The wire names follow what web clients have always sent (`short` /
/// `long`); the descriptive `short-edge` / `long-edge` spellings are
/// accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duplex {
    #[serde(rename = "simplex")]
    Simplex,
    #[serde(rename = "short", alias = "short-edge")]
    ShortEdge,
    #[serde(rename = "long", alias = "long-edge")]
    LongEdge,
}

impl Duplex {
    pub const ALL: [Duplex; 3] = [Duplex::Simplex, Duplex::ShortEdge, Duplex::LongEdge];
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Portrait, Orientation::Landscape];

    /// The literal orientation word understood by both print mechanisms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Print settings for a job. Every dimension is optional; an absent
/// dimension leaves the printer default in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<Duplex>,
    /// Accepts a number or a numeric string; `0` counts as absent.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_copies")]
    pub copies: Option<NonZeroU32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

impl PrintSettings {
    /// Number of copies worth emitting a flag for (`None` for 0/1 copy).
    pub fn extra_copies(&self) -> Option<u32> {
        self.copies.map(NonZeroU32::get).filter(|&n| n > 1)
    }
}

/// One request to render-and/or-print one document to one printer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintJob {
    #[serde(skip)]
    pub id: JobId,
    /// Page to render when no inline content is supplied.
    #[serde(default)]
    pub url: String,
    pub printer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: PrintSettings,
    /// Base64-encoded, pre-rendered document.
    #[serde(
        default,
        rename = "content",
        alias = "inlineContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_content: Option<String>,
}

impl PrintJob {
    /// A job whose document is rendered from `url`.
    pub fn from_url(url: impl Into<String>, printer: impl Into<String>, settings: PrintSettings) -> Self {
        Self {
            id: JobId::new(),
            url: url.into(),
            printer: printer.into(),
            settings,
            inline_content: None,
        }
    }

    /// A job carrying its own base64-encoded document.
    pub fn inline(content: impl Into<String>, printer: impl Into<String>, settings: PrintSettings) -> Self {
        Self {
            id: JobId::new(),
            url: String::new(),
            printer: printer.into(),
            settings,
            inline_content: Some(content.into()),
        }
    }
}

/// Outcome of a single job, reported in batch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for JobResult {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::failed(e),
        }
    }
}

/// Lifecycle state of the listening print server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Stopped,
    Running,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Running => f.write_str("running"),
        }
    }
}

/// TLS options for the listener. Certificate and key are PEM text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpsSettings {
    pub use_https: bool,
    pub https_cert: String,
    pub https_cert_key: String,
}

impl HttpsSettings {
    pub fn plain() -> Self {
        Self::default()
    }
}

/// A host network interface, offered to the operator when choosing a bind
/// address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    pub address: IpAddr,
    pub loopback: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_copies<'de, D>(deserializer: D) -> std::result::Result<Option<NonZeroU32>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(CopiesVisitor)
}

struct CopiesVisitor;

impl<'de> Visitor<'de> for CopiesVisitor {
    type Value = Option<NonZeroU32>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative copy count, as a number or a numeric string")
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error> {
        deserializer.deserialize_any(CopiesVisitor)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        let count = u32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))?;
        Ok(NonZeroU32::new(count))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<u64>() {
            Ok(n) => self.visit_u64(n),
            Err(_) => Err(E::invalid_value(Unexpected::Str(v), &self)),
        }
    }
}
