//! Result records produced by the three pipeline stages.
//!
//! Decoding is strict: wrong JSON types and missing required fields fail, absent list
//! fields become empty vectors, and explicit `null` is never accepted for a list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Post-decoding checks that serde attributes alone cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// An integer score in `0..=100`. Out-of-range values are rejected, not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }
}

impl TryFrom<i64> for Percentage {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Percentage::new)
            .ok_or_else(|| format!("score {value} is outside the range 0..=100"))
    }
}

impl From<Percentage> for u8 {
    fn from(p: Percentage) -> Self {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requirements extracted from a job vacancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience: String,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub seniority_level: Option<String>,
}

/// Structured review of a candidate CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub seniority_level: Option<String>,
}

/// Match score between one CV analysis and one set of job requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingScore {
    pub overall_score: Percentage,
    pub skills_match: Percentage,
    pub experience_match: Percentage,
    pub detailed_feedback: String,
    #[serde(default)]
    pub missing_requirements: Vec<String>,
    #[serde(default)]
    pub improvement_suggestions: Vec<String>,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub matched_qualifications: Vec<String>,
    #[serde(default)]
    pub matched_languages: Vec<String>,
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("required field `{field}` is blank"));
    }
    Ok(())
}

impl Validate for JobRequirements {
    fn validate(&self) -> Result<(), String> {
        require_text("experience", &self.experience)
    }
}

impl Validate for CvAnalysis {
    fn validate(&self) -> Result<(), String> {
        require_text("experience_summary", &self.experience_summary)
    }
}

impl Validate for MatchingScore {
    fn validate(&self) -> Result<(), String> {
        require_text("detailed_feedback", &self.detailed_feedback)
    }
}
