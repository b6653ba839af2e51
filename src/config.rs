// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration.
//!
//! Loaded from TOML, every section optional:
//!
//! ```toml
//! [ranking]
//! default_model = "bm25"
//! top_k = 10
//! combination = "reciprocal-rank"
//! default_operator = "or"
//! rrf_k = 60.0
//! # documents per run fed to rank-based fusion; top_k when unset
//! fusion_depth = 100
//!
//! [models.bm25]
//! k1 = 0.9
//! b = 0.4
//!
//! [evaluation]
//! metrics = ["ndcg@10", "map"]
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! `[models.<name>]` tables replace a model's built-in defaults; a request's
//! own parameters still win over them.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::eval::{default_metrics, Metric};
use crate::query::DefaultOperator;
use crate::rank::Combination;
use crate::scoring::{ModelKind, ModelSpec, ParamMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranking: RankingConfig,
    /// Default parameters per model name.
    pub models: BTreeMap<String, ParamMap>,
    pub evaluation: EvaluationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub default_model: String,
    pub top_k: usize,
    pub combination: String,
    pub default_operator: DefaultOperator,
    pub rrf_k: f64,
    /// Run depth for `reciprocal-rank`, `borda` and `markov-chain`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fusion_depth: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_model: ModelKind::Bm25.name().to_string(),
            top_k: 10,
            combination: "reciprocal-rank".to_string(),
            default_operator: DefaultOperator::Or,
            rrf_k: crate::rank::fusion::DEFAULT_RRF_K,
            fusion_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub metrics: Vec<String>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics().iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value the way a request would be checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranking = &self.ranking;
        ModelKind::from_str(&ranking.default_model)
            .map_err(|e| ConfigError::invalid("ranking.default_model", e.to_string()))?;
        if ranking.top_k == 0 {
            return Err(ConfigError::invalid("ranking.top_k", "must be >= 1"));
        }
        if !(ranking.rrf_k.is_finite() && ranking.rrf_k > 0.0) {
            return Err(ConfigError::invalid("ranking.rrf_k", "must be finite and > 0"));
        }
        if ranking.fusion_depth == Some(0) {
            return Err(ConfigError::invalid("ranking.fusion_depth", "must be >= 1"));
        }
        Combination::parse(&ranking.combination, ranking.rrf_k)
            .map_err(|e| ConfigError::invalid("ranking.combination", e.to_string()))?;

        for (name, params) in &self.models {
            let field = format!("models.{}", name);
            let kind = ModelKind::from_str(name).map_err(|e| ConfigError::invalid(&field, e.to_string()))?;
            if kind.name() != name {
                return Err(ConfigError::invalid(
                    &field,
                    format!("use the canonical model name '{}'", kind.name()),
                ));
            }
            ModelSpec::build(kind, params).map_err(|e| ConfigError::invalid(&field, e.to_string()))?;
        }

        for metric in &self.evaluation.metrics {
            Metric::from_str(metric).map_err(|reason| ConfigError::invalid("evaluation.metrics", reason))?;
        }

        tracing::Level::from_str(&self.logging.level)
            .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;
        Ok(())
    }

    /// Default parameters configured for a model; empty when none.
    pub fn model_defaults(&self, kind: ModelKind) -> ParamMap {
        self.models.get(kind.name()).cloned().unwrap_or_default()
    }

    /// Evaluation metrics, parsed. Validation guarantees they parse.
    pub fn metrics(&self) -> Vec<Metric> {
        self.evaluation
            .metrics
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect()
    }

    /// Apply `POLYRANK_*` environment variables.
    ///
    /// Only variables that are set are applied. Unparsable or out-of-domain
    /// values are ignored with a warning.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// [`with_env_overrides`](Self::with_env_overrides) over any lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("POLYRANK_MODEL") {
            match ModelKind::from_str(&val) {
                Ok(kind) => self.ranking.default_model = kind.name().to_string(),
                Err(_) => warn!(variable = "POLYRANK_MODEL", value = %val, "ignoring unknown model"),
            }
        }
        if let Some(val) = lookup("POLYRANK_TOP_K") {
            match val.parse::<usize>() {
                Ok(k) if k > 0 => self.ranking.top_k = k,
                _ => warn!(variable = "POLYRANK_TOP_K", value = %val, "ignoring invalid top_k"),
            }
        }
        if let Some(val) = lookup("POLYRANK_COMBINATION") {
            match Combination::parse(&val, self.ranking.rrf_k) {
                Ok(policy) => {
                    self.ranking.combination = crate::rank::CombinationPolicy::name(&policy).to_string()
                }
                Err(_) => warn!(variable = "POLYRANK_COMBINATION", value = %val, "ignoring unknown policy"),
            }
        }
        if let Some(val) = lookup("POLYRANK_LOG_JSON") {
            match val.trim() {
                "1" | "true" => self.logging.json = true,
                "0" | "false" => self.logging.json = false,
                _ => warn!(variable = "POLYRANK_LOG_JSON", value = %val, "ignoring invalid flag"),
            }
        }
        self
    }
}
