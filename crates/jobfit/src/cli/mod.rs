pub mod entities;
pub mod matching;
pub mod templates;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use jobfit_core::{Document, MatcherConfig, ScoringMethod};

#[derive(Parser)]
#[command(
    name = "jobfit",
    about = "Score resumes against job descriptions",
    version
)]
pub struct Cli {
    /// Configuration file (JSON); falls back to $JOBFIT_CONFIG, then the user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match one resume against one or more job descriptions
    Match {
        /// Resume file (PDF or DOCX)
        resume: PathBuf,
        /// Job description text file
        #[arg(long = "job")]
        jobs: Vec<PathBuf>,
        /// Built-in job description template
        #[arg(long = "template")]
        templates: Vec<String>,
        #[arg(long, value_enum, default_value_t = Method::Lexical)]
        method: Method,
    },
    /// Rank many resumes against one job description
    #[command(group(ArgGroup::new("target").required(true).args(["job", "template"])))]
    Rank {
        /// Resume files (PDF or DOCX)
        #[arg(required = true)]
        resumes: Vec<PathBuf>,
        /// Job description text file
        #[arg(long)]
        job: Option<PathBuf>,
        /// Built-in job description template
        #[arg(long)]
        template: Option<String>,
        #[arg(long, value_enum, default_value_t = Method::Lexical)]
        method: Method,
    },
    /// Show skills, experience and locations found in a resume
    Entities {
        /// Resume file (PDF or DOCX)
        resume: PathBuf,
    },
    /// List built-in job description templates
    Templates,
}

/// Scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// TF-IDF cosine over the resume and job description
    Lexical,
    /// Sentence-embedding cosine (needs the `bert` feature)
    Semantic,
}

impl From<Method> for ScoringMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Lexical => Self::Lexical,
            Method::Semantic => Self::Semantic,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<MatcherConfig> {
    MatcherConfig::discover(path).context("failed to load configuration")
}

pub fn read_resume(path: &Path) -> Result<Document> {
    Document::read(path).with_context(|| format!("failed to read resume {}", path.display()))
}

/// Job description name and text from a UTF-8 file.
pub fn read_job(path: &Path) -> Result<(String, String)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read job description {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok((name, text))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
