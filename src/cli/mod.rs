// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the polyrank command-line interface.
//!
//! Four subcommands: `build` turns a corpus into a snapshot file, `inspect`
//! summarizes one, `rank` runs a single request against it and `evaluate`
//! scores a whole topic set against TREC qrels.

pub mod commands;
pub mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "polyrank",
    about = "Classical retrieval models over immutable index snapshots",
    version
)]
pub struct Cli {
    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level when neither POLYRANK_LOG nor RUST_LOG is set
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a snapshot from a directory of .txt files or a JSONL corpus
    ///
    /// JSONL lines look like {"key": "doc1", "text": "...", "links": ["doc2"]}.
    /// Links feed the PageRank prior; `links` is optional.
    Build {
        /// Corpus directory or .jsonl file
        #[arg(short, long)]
        input: PathBuf,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// PageRank damping factor for linked corpora
        #[arg(long, default_value = "0.85")]
        damping: f64,
    },

    /// Show collection statistics of a snapshot
    Inspect {
        /// Snapshot file
        snapshot: PathBuf,

        /// Also show the statistics and postings of these terms
        #[arg(short, long)]
        term: Vec<String>,
    },

    /// Rank the snapshot's documents for one query
    Rank {
        /// Snapshot file
        snapshot: PathBuf,

        /// Query text; omit when using --request
        query: Option<String>,

        /// Full JSON ranking request instead of flags
        #[arg(long, conflicts_with_all = ["query", "model", "ensemble"])]
        request: Option<PathBuf>,

        /// Model name (defaults to the configured default model)
        #[arg(short, long)]
        model: Option<String>,

        /// Model parameter as name=value; repeatable
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Fuse several models (comma-separated names) instead of one
        #[arg(long, value_delimiter = ',', conflicts_with = "model")]
        ensemble: Vec<String>,

        /// Combination policy for --ensemble
        #[arg(long)]
        combination: Option<String>,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Attach per-term explanations
        #[arg(long)]
        explain: bool,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Evaluate a model over a topic set with TREC qrels
    Evaluate {
        /// Snapshot file
        snapshot: PathBuf,

        /// Topics as JSON [{"id": ..., "query": ...}]
        #[arg(long)]
        topics: PathBuf,

        /// TREC qrels file
        #[arg(long)]
        qrels: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Metrics such as ndcg@10 or map; defaults to the configured list
        #[arg(long = "metric")]
        metrics: Vec<String>,

        /// Ranking depth per topic
        #[arg(short = 'k', long)]
        depth: Option<usize>,

        /// Write the full report as JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}
