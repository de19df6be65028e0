use anyhow::Result;

use jobfit_core::MatcherConfig;

use super::print_json;

pub fn run(config: &MatcherConfig) -> Result<()> {
    let names: Vec<&str> = config.template_names().collect();
    print_json(&names)
}
