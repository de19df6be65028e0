use std::path::Path;

use anyhow::Result;

use jobfit_core::{MatchPipeline, MatcherConfig};

use super::{print_json, read_resume};

pub fn run(config: MatcherConfig, resume: &Path) -> Result<()> {
    let pipeline = MatchPipeline::new(config);
    let document = read_resume(resume)?;
    let prepared = pipeline.prepare_resume(&document);
    print_json(&prepared.entities)
}
