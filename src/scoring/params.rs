// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Named model parameters: the untyped request map and its typed reading.
//!
//! Requests carry `name -> value` maps. Each model reads its own fields
//! through a [`ParamReader`], which applies defaults for absent fields,
//! rejects fields the model does not declare, and never clamps: an out-of-domain
//! value is an `InvalidParameter` naming the field.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// A parameter value as it arrives in a request or config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(x) => Some(*x),
            ParamValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::Number(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(x) => write!(f, "{}", x),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Number(x)
    }
}

impl From<u32> for ParamValue {
    fn from(x: u32) -> Self {
        ParamValue::Number(f64::from(x))
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

pub type ParamMap = BTreeMap<String, ParamValue>;

/// Build a `ParamMap` from `(name, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> ParamMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ParamValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Model name plus the fully resolved parameters it ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: ParamMap,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, params: ParamMap) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

/// Typed, consuming view over a `ParamMap` for one model.
pub struct ParamReader<'a> {
    model: &'static str,
    params: &'a ParamMap,
    seen: Vec<&'static str>,
}

impl<'a> ParamReader<'a> {
    pub fn new(model: &'static str, params: &'a ParamMap) -> Self {
        Self {
            model,
            params,
            seen: Vec::new(),
        }
    }

    fn error(&self, field: &str, reason: impl Into<String>) -> RankError {
        RankError::invalid_param(self.model, field, reason)
    }

    fn raw(&mut self, field: &'static str) -> Option<&'a ParamValue> {
        self.seen.push(field);
        self.params.get(field)
    }

    /// A finite real number.
    pub fn number(&mut self, field: &'static str, default: f64) -> Result<f64, RankError> {
        let value = match self.raw(field) {
            None => return Ok(default),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| self.error(field, format!("expected a number, got '{}'", v)))?,
        };
        if !value.is_finite() {
            return Err(self.error(field, "must be finite"));
        }
        Ok(value)
    }

    /// A real number that may also be `inf`.
    pub fn number_or_infinity(&mut self, field: &'static str, default: f64) -> Result<f64, RankError> {
        let value = match self.raw(field) {
            None => return Ok(default),
            Some(ParamValue::Text(s))
                if matches!(s.trim().to_ascii_lowercase().as_str(), "inf" | "infinity" | "∞") =>
            {
                f64::INFINITY
            }
            Some(v) => v
                .as_f64()
                .ok_or_else(|| self.error(field, format!("expected a number or 'inf', got '{}'", v)))?,
        };
        if value.is_nan() {
            return Err(self.error(field, "must be a number"));
        }
        Ok(value)
    }

    /// A non-negative whole number.
    pub fn count(&mut self, field: &'static str, default: u32) -> Result<u32, RankError> {
        let Some(value) = self.raw(field) else {
            return Ok(default);
        };
        match value.as_f64() {
            Some(x) if x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x <= f64::from(u32::MAX) => {
                Ok(x as u32)
            }
            _ => Err(self.error(field, format!("expected a non-negative integer, got '{}'", value))),
        }
    }

    /// One of a fixed set of names.
    pub fn choice<T>(&mut self, field: &'static str, default: T) -> Result<T, RankError>
    where
        T: FromStr<Err = String>,
    {
        match self.raw(field) {
            None => Ok(default),
            Some(ParamValue::Text(s)) => s.parse().map_err(|reason| self.error(field, reason)),
            Some(v) => Err(self.error(field, format!("expected a name, got '{}'", v))),
        }
    }

    /// Reject any field the model never asked for.
    pub fn finish(self) -> Result<(), RankError> {
        for key in self.params.keys() {
            if !self.seen.iter().any(|f| f == key) {
                return Err(self.error(key, "unknown parameter"));
            }
        }
        Ok(())
    }
}

/// Fail with `InvalidParameter` unless `ok`.
pub fn ensure(model: &str, field: &str, ok: bool, reason: &str) -> Result<(), RankError> {
    if ok {
        Ok(())
    } else {
        Err(RankError::invalid_param(model, field, reason))
    }
}
