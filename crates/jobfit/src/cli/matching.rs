use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use jobfit_core::{MatchPipeline, MatcherConfig, PreparedJob, ScoringMethod};

use super::{print_json, read_job, read_resume};

pub async fn run_match(
    config: MatcherConfig,
    resume: &Path,
    jobs: &[PathBuf],
    templates: &[String],
    method: ScoringMethod,
) -> Result<()> {
    if jobs.is_empty() && templates.is_empty() {
        bail!("no job description given; pass --job FILE or --template NAME");
    }

    let pipeline = MatchPipeline::new(config);
    let document = read_resume(resume)?;

    let mut prepared = Vec::with_capacity(jobs.len() + templates.len());
    for path in jobs {
        let (name, text) = read_job(path)?;
        prepared.push(pipeline.prepare_job(&name, &text));
    }
    for name in templates {
        prepared.push(pipeline.prepare_template(name)?);
    }

    tracing::debug!("Matching {} against {} job descriptions", document.name(), prepared.len());

    let resume = pipeline.prepare_resume(&document);
    if resume.text.is_empty() {
        eprintln!("Warning: no text could be extracted from {}", resume.name);
    }

    let batch = pipeline.rank_jobs(resume, prepared, method).await?;
    print_json(&batch.matches)
}

pub async fn run_rank(
    config: MatcherConfig,
    resumes: &[PathBuf],
    job: Option<&Path>,
    template: Option<&str>,
    method: ScoringMethod,
) -> Result<()> {
    let pipeline = MatchPipeline::new(config);
    let job = prepare_target(&pipeline, job, template)?;

    let documents = resumes
        .iter()
        .map(|path| read_resume(path))
        .collect::<Result<Vec<_>>>()?;

    let batch = pipeline.rank_resumes(documents, job, method).await?;
    eprintln!(
        "Ranked {} resumes (average score {:.2})",
        batch.analytics.count, batch.analytics.average_score
    );
    print_json(&batch)
}

fn prepare_target(
    pipeline: &MatchPipeline,
    job: Option<&Path>,
    template: Option<&str>,
) -> Result<PreparedJob> {
    match (job, template) {
        (Some(path), _) => {
            let (name, text) = read_job(path)?;
            Ok(pipeline.prepare_job(&name, &text))
        }
        (None, Some(name)) => Ok(pipeline.prepare_template(name)?),
        (None, None) => bail!("no job description given; pass --job FILE or --template NAME"),
    }
}
