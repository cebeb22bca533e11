// All LLM prompt constants for the matching pipeline.
// Each template names exactly the JSON keys of its result record.

/// A fixed, versioned instruction for one stage.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub version: &'static str,
    pub system: &'static str,
    pub instruction: &'static str,
}

/// Job vacancy → `JobRequirements`. Replace `{vacancy_text}` before sending.
pub const JOB_REQUIREMENTS: PromptTemplate = PromptTemplate {
    name: "job_requirements",
    version: "v1",
    system: "You are an expert recruiter who extracts actionable, quantifiable requirements \
        from job vacancies.",
    instruction: r#"Extract the job requirements from the vacancy text below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "skills": ["Go", "AWS"],
  "experience": "5+ years of backend development",
  "qualifications": ["BSc in Computer Science or equivalent"],
  "languages": ["English"],
  "certifications": ["AWS Certified Solutions Architect"],
  "responsibilities": ["Design and operate distributed services"],
  "seniority_level": "Senior"
}

KEYS:
- skills: technical and soft skills the role requires, most important first.
- experience: REQUIRED. Minimum years and type of experience (industry, leadership, client-facing).
  If the vacancy gives no detail, write "Not specified".
- qualifications: education and other formal qualifications.
- languages: spoken or written languages required (not programming languages).
- certifications: named professional certifications or licenses.
- responsibilities: the main duties and accountabilities of the role.
- seniority_level: e.g. "Junior", "Mid", "Senior", "Lead"; null if it cannot be determined.

VACANCY TEXT:
{vacancy_text}"#,
};

/// Attached CV document → `CvAnalysis`. No placeholders: the document travels as an attachment.
pub const CV_REVIEW: PromptTemplate = PromptTemplate {
    name: "cv_review",
    version: "v1",
    system: "You are an expert career advisor and resume analyst.",
    instruction: r#"Analyze the attached CV and provide a detailed breakdown of strengths, weaknesses, and improvement recommendations.

Return a JSON object with this EXACT schema (no extra fields):
{
  "skills": ["Go", "PostgreSQL", "Team leadership"],
  "experience_summary": "Eight years building payment backends, the last three leading a team of five.",
  "strengths": ["Deep distributed systems experience"],
  "weaknesses": ["No cloud certification"],
  "recommendations": ["Quantify the impact of the payments migration"],
  "languages": ["English", "Dutch"],
  "certifications": [],
  "responsibilities": ["Led the payments platform team"],
  "seniority_level": "Senior"
}

KEYS:
- skills: technical skills listed in the CV plus soft skills demonstrated by roles held.
- experience_summary: REQUIRED. Concise career progression, key roles and quantified achievements.
- strengths: what makes the candidate stand out, with specifics from the CV.
- weaknesses: gaps or weak spots visible in the CV.
- recommendations: concrete, actionable changes that would improve the CV.
- languages: spoken or written languages.
- certifications: professional certifications, licenses or formal qualifications.
- responsibilities: responsibilities held in previous roles.
- seniority_level: seniority inferred from the CV; null if it cannot be determined."#,
};

/// CV analysis + job requirements → `MatchingScore`.
/// Replace `{cv_analysis}` and `{job_requirements}` before sending.
pub const MATCH_SCORING: PromptTemplate = PromptTemplate {
    name: "match_scoring",
    version: "v1",
    system: "You are an expert resume analyst and job matching specialist. \
        Your scoring is objective, evidence-based and specific.",
    instruction: r#"Score how well the candidate matches the job requirements.

CANDIDATE CV ANALYSIS:
{cv_analysis}

JOB REQUIREMENTS:
{job_requirements}

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall_score": 72,
  "skills_match": 65,
  "experience_match": 80,
  "detailed_feedback": "Strong backend background; cloud experience is the main gap.",
  "missing_requirements": ["AWS"],
  "improvement_suggestions": ["Highlight any AWS exposure from side projects"],
  "matched_skills": ["Go"],
  "matched_qualifications": [],
  "matched_languages": ["English"]
}

KEYS:
- overall_score, skills_match, experience_match: INTEGERS from 0 to 100 inclusive.
  Weight skills, experience and responsibilities higher than education or certifications.
- detailed_feedback: REQUIRED. Concise justification of the scores.
- missing_requirements: job requirements with no evidence in the CV.
- improvement_suggestions: prioritized, specific advice for this job.
- matched_skills: job skills that the CV demonstrates.
- matched_qualifications: job qualifications or certifications present in the CV.
- matched_languages: job languages present in the CV.

If the CV gives no information for a category, score it lower. A skill on the CV that
the job does not ask for must not raise the score."#,
};

/// Substitutes each `{key}` placeholder in the template instruction in a single pass.
///
/// Only the template text is scanned: a substituted value is never searched for
/// placeholders again. Braces that do not name a known key are copied through.
pub fn render(template: &PromptTemplate, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.instruction.len());
    let mut rest = template.instruction;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let placeholder = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });

        match placeholder {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
