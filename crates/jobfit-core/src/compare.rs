//! Skill-gap comparison and the advice derived from it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityBundle, SkillSet};
use crate::similarity::MatchScore;

/// Skills from the job description split by whether the resume has them.
/// Both lists are sorted ascending and never share an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

impl ComparisonResult {
    /// The first `n` missing skills in sorted order.
    #[must_use]
    pub fn top_missing(&self, n: usize) -> &[String] {
        &self.missing[..n.min(self.missing.len())]
    }

    #[must_use]
    pub fn covers_all(&self) -> bool {
        self.missing.is_empty()
    }
}

#[must_use]
pub fn compare_skills(resume: &EntityBundle, job_skills: &SkillSet) -> ComparisonResult {
    let have: BTreeSet<String> = resume.skills.iter().map(|s| s.to_lowercase()).collect();
    let want: BTreeSet<String> = job_skills.iter().map(str::to_lowercase).collect();

    ComparisonResult {
        matched: want.intersection(&have).cloned().collect(),
        missing: want.difference(&have).cloned().collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Great,
    Moderate,
    Low,
}

impl MatchStatus {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Great => "Great Match",
            Self::Moderate => "Moderate Match",
            Self::Low => "Low Match",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Score cut-offs for [`MatchStatus`]. A score must be strictly above a
/// threshold to reach that status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    pub great: f64,
    pub moderate: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            great: 80.0,
            moderate: 50.0,
        }
    }
}

impl StatusThresholds {
    #[must_use]
    pub fn status(&self, score: MatchScore) -> MatchStatus {
        let value = score.value();
        if value > self.great {
            MatchStatus::Great
        } else if value > self.moderate {
            MatchStatus::Moderate
        } else {
            MatchStatus::Low
        }
    }

    /// Resume advice for a scored pair: one line about skill coverage, one
    /// about the score band.
    #[must_use]
    pub fn suggestions(
        &self,
        score: MatchScore,
        comparison: &ComparisonResult,
        top_n: usize,
    ) -> Vec<String> {
        let mut advice = Vec::with_capacity(2);

        if comparison.covers_all() {
            advice.push("Your resume covers all the key skills in the job description.".to_string());
        } else {
            advice.push(format!(
                "Consider adding these skills to your resume if you have them: {}",
                comparison.top_missing(top_n).join(", ")
            ));
        }

        let value = score.value();
        if value < self.moderate {
            advice.push(
                "Your match score is low. Try to tailor your resume more closely to the job description."
                    .to_string(),
            );
        } else if value < self.great {
            advice.push(
                "Your match is moderate. Consider emphasizing relevant skills and experience.".to_string(),
            );
        } else {
            advice.push("Great match! Your resume is highly relevant to this job.".to_string());
        }

        advice
    }
}
