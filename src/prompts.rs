//! Prompt templates for career-coaching tasks.
//!
//! Pure data transformation: task parameters in, prompt text out. Missing
//! parameters never fail rendering; they fall back to per-field defaults.

use serde_json::{Map, Value};

/// Loosely-typed parameter bag supplied by the caller.
pub type TaskParams = Map<String, Value>;

// =============================================================================
// Parameter resolution
// =============================================================================

/// A logical input field with its accepted keys, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct ParamField {
    pub keys: &'static [&'static str],
    pub default: &'static str,
}

impl ParamField {
    /// First key holding a non-empty string wins; otherwise the default.
    /// Non-string values are ignored.
    pub fn resolve<'a>(&self, params: &'a TaskParams) -> &'a str {
        self.keys
            .iter()
            .filter_map(|key| params.get(*key).and_then(Value::as_str))
            .find(|v| !v.is_empty())
            .unwrap_or(self.default)
    }
}

pub const CV_TEXT: ParamField = ParamField {
    keys: &["cvText", "cv_text"],
    default: "",
};

pub const JOB_DESCRIPTION: ParamField = ParamField {
    keys: &["jobDescription", "job_description"],
    default: "",
};

pub const TONE: ParamField = ParamField {
    keys: &["tone"],
    default: "professional",
};

// =============================================================================
// Prompt templates
// =============================================================================

/// Rendered prompt ready for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptInstance {
    pub template_slug: &'static str,
    pub text: String,
}

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub slug: &'static str,
    pub body: &'static str,
}

impl PromptTemplate {
    /// Substitute placeholders in a single pass, so substituted values are
    /// never themselves scanned for placeholders.
    pub fn render(&self, vars: &[(&str, &str)]) -> PromptInstance {
        let mut out = String::with_capacity(
            self.body.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>(),
        );
        let mut rest = self.body;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let hit = vars.iter().find_map(|(name, value)| {
                let close = name.len() + 1;
                let matches = tail.len() > close
                    && tail.as_bytes()[close] == b'}'
                    && &tail.as_bytes()[1..close] == name.as_bytes();
                matches.then_some((close + 1, *value))
            });
            match hit {
                Some((consumed, value)) => {
                    out.push_str(value);
                    rest = &tail[consumed..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);

        PromptInstance {
            template_slug: self.slug,
            text: out,
        }
    }
}

pub const COVER_LETTER_V1: PromptTemplate = PromptTemplate {
    slug: "cover_letter_v1",
    body: r#"You are a professional career coach.
Generate a cover letter in a {tone} tone.
The cover letter needs to be short and precise for the job: 4-5 lines.
Include a little information about the submitter.

CV:
{cv_text}

Job Description:
{job_description}

Cover Letter:
"#,
};

pub const RESUME_SCORING_V1: PromptTemplate = PromptTemplate {
    slug: "resume_scoring_v1",
    body: r#"You are a careful, honest career coach and resume analyst.

You are given:
- A candidate resume (CV) text.
- A job description.

Your job:
- Evaluate how well the **actual written CV** matches the job description.
- **Do NOT invent or assume experience, skills, education or achievements that are not explicitly present in the CV text.**
- If the job description requires something that is not clearly mentioned in the CV, treat it as **missing** (a gap), even if it might be realistic that the candidate has it.
- Focus on what is truly written.

Scoring rules:
- Return an integer score between 0 and 100 (inclusive).
- Higher score = stronger match between the written CV and the job description.
- Consider role requirements, years of experience, skills/tech stack, domain knowledge, and responsibilities **only as they appear in the CV**.

Output format:
- You MUST return a strict JSON object with this exact shape:
{
  "score": number,
  "strengths": [
    { "title": string, "description": string },
    { "title": string, "description": string },
    { "title": string, "description": string }
  ],
  "gaps": [
    { "title": string, "description": string },
    { "title": string, "description": string },
    { "title": string, "description": string }
  ],
  "suggestions": string[]
}

Constraints:
- Provide **exactly 3** strengths and **exactly 3** gaps.
- For gaps, explain clearly what is missing in the CV compared to the job description.
- In suggestions, focus on **how to rewrite or reorganize the CV** and **what to explicitly mention** based ONLY on the candidate's real experience as written.
- If something is missing (e.g. a required skill or years of experience) and you do not see it in the CV, you may say:
  - "If you actually have X, add a clear bullet describing it; if you don't, don't claim it."
- Never phrase anything as if the candidate already has experience that does not exist in the CV.

Now analyze:

CV:
=======
{cv_text}
=======

Job Description:
=======
{job_description}
=======

Return only the JSON object, with no extra text, markdown fences or explanation.
"#,
};

// =============================================================================
// Task prompt builders
// =============================================================================

pub fn cover_letter_prompt(params: &TaskParams) -> PromptInstance {
    COVER_LETTER_V1.render(&[
        ("tone", TONE.resolve(params)),
        ("cv_text", CV_TEXT.resolve(params)),
        ("job_description", JOB_DESCRIPTION.resolve(params)),
    ])
}

pub fn resume_scoring_prompt(params: &TaskParams) -> PromptInstance {
    RESUME_SCORING_V1.render(&[
        ("cv_text", CV_TEXT.resolve(params)),
        ("job_description", JOB_DESCRIPTION.resolve(params)),
    ])
}

// =============================================================================
// TESTS
// =============================================================================
