// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Subcommand implementations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use indicatif::{ProgressBar, ProgressStyle};
use polyrank::config::EngineConfig;
use polyrank::error::{ConfigError, RankError, SnapshotError};
use polyrank::eval::{evaluate_run_with_progress, load_qrels, load_topics, EvalInputError, Metric};
use polyrank::index::{IndexBuilder, IndexSnapshot, PageRankConfig, SnapshotHandle};
use polyrank::rank::{
    CancellationToken, ModelRequest, QueryInput, Ranker, RankingRequest, RankingResponse, RankingStatus,
    RunRequest,
};
use polyrank::scoring::{ParamMap, ParamValue};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::display::*;
use super::OutputFormat;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Rank(#[from] RankError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Eval(#[from] EvalInputError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// 2 for requests that were refused as given, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Rank(err) if err.is_rejection() => 2,
            _ => 1,
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `name=value` pairs; values that parse as numbers become numbers.
pub fn parse_params(pairs: &[String]) -> Result<ParamMap, CliError> {
    let mut params = ParamMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| CliError::Usage(format!("parameter '{}' is not NAME=VALUE", pair)))?;
        let value = match value.trim().parse::<f64>() {
            Ok(x) => ParamValue::Number(x),
            Err(_) => ParamValue::Text(value.trim().to_string()),
        };
        params.insert(name.trim().to_string(), value);
    }
    Ok(params)
}

fn open_ranker(snapshot: &Path, config: EngineConfig) -> Result<Ranker, CliError> {
    let snapshot = IndexSnapshot::from_file(snapshot)?;
    Ok(Ranker::new(Arc::new(SnapshotHandle::with_snapshot(snapshot)), config))
}

// =============================================================================
// BUILD
// =============================================================================

#[derive(Debug, Deserialize)]
struct CorpusLine {
    key: String,
    text: String,
    #[serde(default)]
    links: Vec<String>,
}

pub fn run_build(input: &Path, output: &Path, damping: f64) -> Result<(), CliError> {
    if !(damping > 0.0 && damping < 1.0) {
        return Err(CliError::Usage("--damping must be in (0, 1)".into()));
    }
    let started = Instant::now();
    let mut builder = IndexBuilder::new().with_pagerank(PageRankConfig {
        damping,
        ..PageRankConfig::default()
    });

    if input.is_dir() {
        let entries = fs::read_dir(input).map_err(|source| CliError::Io {
            path: input.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        paths.sort();
        for path in paths {
            let key = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            builder.add_text(key, &read(&path)?)?;
        }
    } else {
        for (i, line) in read(input)?.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let doc: CorpusLine = serde_json::from_str(line).map_err(|source| CliError::Json {
                path: PathBuf::from(format!("{}:{}", input.display(), i + 1)),
                source,
            })?;
            for target in &doc.links {
                builder.add_link(doc.key.clone(), target.clone());
            }
            builder.add_text(doc.key, &doc.text)?;
        }
    }

    let snapshot = builder.build()?;
    snapshot.to_file(output)?;
    let stats = snapshot.collection_statistics();
    info!(
        docs = stats.num_docs,
        terms = stats.vocabulary_size,
        output = %output.display(),
        "snapshot written"
    );
    eprintln!(
        "✅ {} documents, {} terms → {} ({})",
        format_count(stats.num_docs),
        format_count(stats.vocabulary_size),
        output.display(),
        timing_ms(started.elapsed().as_secs_f64() * 1000.0)
    );
    Ok(())
}

// =============================================================================
// INSPECT
// =============================================================================

pub fn run_inspect(path: &Path, terms: &[String]) -> Result<(), CliError> {
    let snapshot = IndexSnapshot::from_file(path)?;
    let stats = snapshot.collection_statistics();

    section_top("SNAPSHOT");
    row(&format!("file          {}", truncate(&path.display().to_string(), 56)));
    row(&format!("fingerprint   {}", snapshot.fingerprint_hex()));
    row(&format!("documents     {}", format_count(stats.num_docs)));
    row(&format!("tokens        {}", format_count(stats.total_tokens as usize)));
    row(&format!("vocabulary    {}", format_count(stats.vocabulary_size)));
    row(&format!("avg length    {:.2}", stats.avg_doc_len));
    row(&format!(
        "priors        {}",
        if snapshot.has_priors() { "pagerank" } else { "none" }
    ));

    for term in terms {
        let normalized = polyrank::utils::normalize(term);
        section_mid(&format!("TERM {}", normalized));
        match snapshot.term_id(&normalized) {
            None => row(&paint(GRAY, &[DIM], "not in vocabulary")),
            Some(id) => {
                let ts = snapshot.term_stats(id);
                row(&format!("df {}   cf {}", ts.df, ts.cf));
                for posting in snapshot.postings_by_id(id).iter().take(10) {
                    let key = snapshot.doc_key(posting.doc).unwrap_or("?");
                    row(&format!("  {} tf={}", pad_right(&truncate(key, 40), 40), posting.tf));
                }
                if ts.df > 10 {
                    row(&paint(GRAY, &[DIM], &format!("  … {} more", ts.df - 10)));
                }
            }
        }
    }
    section_bot();
    Ok(())
}

// =============================================================================
// RANK
// =============================================================================

pub struct RankArgs {
    pub snapshot: PathBuf,
    pub query: Option<String>,
    pub request: Option<PathBuf>,
    pub model: Option<String>,
    pub params: Vec<String>,
    pub ensemble: Vec<String>,
    pub combination: Option<String>,
    pub top_k: Option<usize>,
    pub explain: bool,
    pub format: OutputFormat,
}

fn rank_request(args: &RankArgs) -> Result<RankingRequest, CliError> {
    if let Some(path) = &args.request {
        return serde_json::from_str(&read(path)?).map_err(|source| CliError::Json {
            path: path.clone(),
            source,
        });
    }
    let query = args.query.clone().unwrap_or_default();
    let params = parse_params(&args.params)?;
    if args.model.is_none() && !params.is_empty() {
        return Err(CliError::Usage("--param needs --model".into()));
    }
    let mut request = if args.ensemble.is_empty() {
        RankingRequest {
            model: args
                .model
                .as_ref()
                .map(|name| ModelRequest::new(name.clone()).with_params(params)),
            query: QueryInput::from(query.as_str()),
            ..RankingRequest::default()
        }
    } else {
        let runs = args
            .ensemble
            .iter()
            .map(|name| RunRequest::new(ModelRequest::new(name.trim())))
            .collect();
        RankingRequest::ensemble(runs, query.as_str())
    };
    request.top_k = args.top_k;
    request.combination = args.combination.clone();
    request.explain = args.explain;
    Ok(request)
}

pub fn run_rank(args: RankArgs, config: EngineConfig) -> Result<(), CliError> {
    let request = rank_request(&args)?;
    let ranker = open_ranker(&args.snapshot, config)?;
    let started = Instant::now();
    let response = ranker.execute(&request, &CancellationToken::new())?;
    let elapsed = started.elapsed().as_secs_f64() * 1000.0;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&response).map_err(|source| CliError::Json {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
            println!("{}", json);
        }
        OutputFormat::Table => print_ranking(&response, elapsed),
    }
    Ok(())
}

fn print_ranking(response: &RankingResponse, elapsed_ms: f64) {
    let models: Vec<String> = response
        .result
        .models
        .iter()
        .map(|m| m.name.to_string())
        .collect();
    section_top("RANKING");
    row(&format!("models        {}", models.join(", ")));
    if let Some(combination) = &response.result.combination {
        row(&format!("combination   {}", combination));
    }
    row(&format!(
        "candidates    {}   time {}",
        format_count(response.total_candidates),
        timing_ms(elapsed_ms)
    ));
    section_mid("RESULTS");
    if response.status == RankingStatus::EmptyQuery {
        row(&paint(YELLOW, &[], "empty query: no scoring terms"));
    }
    for (i, doc) in response.result.documents.iter().enumerate() {
        row(&format!(
            "{} {} {}",
            pad_left(&(i + 1).to_string(), 4),
            pad_right(&truncate(&doc.key, 48), 48),
            score_value(doc.score)
        ));
        for contribution in doc.explanation.iter().flatten() {
            let share = contribution
                .contribution
                .map_or_else(|| "-".to_string(), |c| format!("{:.6}", c));
            row(&paint(
                GRAY,
                &[],
                &format!("       {} tf={} {}", pad_right(&contribution.term, 24), contribution.tf, share),
            ));
        }
    }
    section_bot();
}

// =============================================================================
// EVALUATE
// =============================================================================

pub struct EvaluateArgs {
    pub snapshot: PathBuf,
    pub topics: PathBuf,
    pub qrels: PathBuf,
    pub model: Option<String>,
    pub params: Vec<String>,
    pub metrics: Vec<String>,
    pub depth: Option<usize>,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

#[cfg(feature = "parallel")]
fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} {prefix:<10} [{bar:40.cyan/dim}] {pos}/{len}")
    {
        bar.set_style(style.progress_chars("━━╸"));
    }
    bar.set_prefix("Topics");
    bar
}

pub fn run_evaluate(args: EvaluateArgs, config: EngineConfig) -> Result<(), CliError> {
    let metrics: Vec<Metric> = if args.metrics.is_empty() {
        config.metrics()
    } else {
        args.metrics
            .iter()
            .map(|m| m.parse().map_err(CliError::Usage))
            .collect::<Result<_, _>>()?
    };
    let model = ModelRequest::new(
        args.model
            .clone()
            .unwrap_or_else(|| config.ranking.default_model.clone()),
    )
    .with_params(parse_params(&args.params)?);
    let mut template = RankingRequest::new(model, "");
    template.top_k = args.depth;

    let topics = load_topics(&args.topics)?;
    let qrels = load_qrels(&args.qrels)?;
    let ranker = open_ranker(&args.snapshot, config)?;

    #[cfg(feature = "parallel")]
    let report = {
        let judged = topics.iter().filter(|t| qrels.contains_key(&t.id)).count();
        let bar = progress_bar(judged);
        let report = evaluate_run_with_progress(
            &ranker,
            &topics,
            &qrels,
            &template,
            &metrics,
            &CancellationToken::new(),
            &|_| bar.inc(1),
        );
        bar.finish_and_clear();
        report?
    };
    #[cfg(not(feature = "parallel"))]
    let report = evaluate_run_with_progress(
        &ranker,
        &topics,
        &qrels,
        &template,
        &metrics,
        &CancellationToken::new(),
        &|_| {},
    )?;

    let json = serde_json::to_string_pretty(&report).map_err(|source| CliError::Json {
        path: PathBuf::from("<report>"),
        source,
    })?;
    if let Some(path) = &args.output {
        fs::write(path, &json).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
    }

    match args.format {
        OutputFormat::Json => println!("{}", json),
        OutputFormat::Table => {
            section_top("EVALUATION");
            row(&format!("model         {}", template.model.map(|m| m.name).unwrap_or_default()));
            row(&format!("topics        {}", report.topics.len()));
            if !report.unjudged.is_empty() {
                row(&paint(
                    YELLOW,
                    &[],
                    &format!("unjudged      {} (not averaged)", report.unjudged.len()),
                ));
            }
            section_mid("MEANS");
            for (metric, value) in &report.means {
                row(&format!("{} {}", pad_right(&metric.to_string(), 16), metric_value(*value)));
            }
            section_bot();
        }
    }
    Ok(())
}
