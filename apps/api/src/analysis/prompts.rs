// All instruction constants for the analysis pipeline.
// Templates use `{placeholder}` markers replaced before sending.

/// Role instruction for job posting extraction.
pub const JOB_PROFILE_ROLE: &str = "You are an expert job posting analyzer for tech recruitment. \
    Extract structured recruiting signal from a tech job posting.";

/// Output schema for job posting extraction.
pub const JOB_PROFILE_SCHEMA: &str = r#"Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "string",
  "required_skills": ["must-have skills"],
  "preferred_skills": ["nice-to-have skills"],
  "responsibilities": ["main duties, in posting order"],
  "ats_keywords": ["critical keywords an ATS would scan for"],
  "company_type": "Startup | Scale-up | Enterprise | Agency | Unknown",
  "work_environment": ["environment signals"],
  "tone_of_voice": "short description",
  "culture_signals": ["culture indicators"],
  "technical_domains": ["Frontend, Backend, DevOps, Data, ..."],
  "urgency": "Low | Normal | High",
  "remote_policy": "Remote | Hybrid | On-site | Unknown"
}"#;

/// Job extraction user template. Replace `{posting}`.
pub const JOB_PROFILE_TEMPLATE: &str = "Analyze this job posting:\n\n{posting}";

/// Role instruction for candidate matching.
pub const MATCH_REPORT_ROLE: &str = "You are a targeted technical profile analyzer. \
    Score a candidate's résumé against the job requirements you are given.";

/// Output schema for candidate matching.
pub const MATCH_REPORT_SCHEMA: &str = r#"Return a JSON object with this EXACT schema:
{
  "candidate_name": "string",
  "overall_score": 50,
  "skill_scores": {"Python": 7, "Docker": 5},
  "experience_relevance": [
    {"role": "string", "organization": "string", "period": "string", "score": 6, "notes": "string"}
  ],
  "skill_gaps": ["required or preferred skills missing from the résumé"],
  "recommendations": ["improvement suggestions"],
  "summary": "overall assessment"
}

SCORING:
- overall_score: integer 0-100
- skill_scores: one entry per job skill, integer 0-10
- experience_relevance.score: integer 0-10"#;

/// Matching user template.
/// Replace: {title}, {required}, {preferred}, {responsibilities}, {domains}, {resume}
pub const MATCH_REPORT_TEMPLATE: &str = r#"JOB REQUIREMENTS
Title: {title}

Must-have skills:
{required}

Nice-to-have skills:
{preferred}

Key responsibilities:
{responsibilities}

Technical domains:
{domains}

RÉSUMÉ
{resume}"#;

/// Role instruction for clarification drafting.
pub const CLARIFICATION_ROLE: &str = "You are a skills gap identifier for résumé optimization. \
    Identify ONLY truly missing critical skills that would significantly improve the job match.";

/// Output schema and constraints for clarification drafting.
pub const CLARIFICATION_SCHEMA: &str = r#"RULES:
- Only list skills that appear in the job's must-have or nice-to-have lists AND are wholly absent from the résumé
- Do NOT list skills the candidate already shows some experience with
- List at most 5 skills
- If there is no material gap, return an empty missing_skills array

Return a JSON object:
{
  "rationale": "Brief summary of the gaps (1-2 sentences)",
  "missing_skills": ["Skill"]
}"#;

/// Clarification user template.
/// Replace: {required}, {preferred}, {score}, {skill_scores}, {gaps}, {recommendations}
pub const CLARIFICATION_TEMPLATE: &str = r#"Job must-have skills:
{required}

Job nice-to-have skills:
{preferred}

Profile analysis results:
- Overall score: {score}/100
- Skill scores: {skill_scores}
- Candidate gaps:
{gaps}
- Recommendations:
{recommendations}

If the candidate already shows good alignment, return an empty missing_skills array."#;

/// Role instruction for résumé synthesis.
pub const SYNTHESIS_ROLE: &str = "You are a résumé section generator. \
    Generate optimized résumé data tailored to the job requirements.";

/// Output schema and rules for résumé synthesis.
pub const SYNTHESIS_SCHEMA: &str = r#"Return a JSON object with this EXACT structure:
{
  "personal": {
    "name": "Full Name",
    "title": "Job title optimized for the role",
    "email": "",
    "phone": "",
    "location": "City, Country",
    "summary": "Professional summary optimized for the job (2-3 sentences)"
  },
  "education": [
    {"degree": "Degree Name", "school": "Institution", "start": "YYYY", "end": "YYYY"}
  ],
  "experience": [
    {"title": "Job Title", "company": "Company", "start": "YYYY", "end": "Present or YYYY", "summary": "Rewritten, job-relevant description"}
  ],
  "skills": ["most relevant first"],
  "links": {"linkedin": "", "github": ""}
}

RULES:
1. Prioritize must-have skills, then nice-to-have skills, in the skills list
2. Include every confirmed skill in the skills list
3. Rewrite experience summaries with job-relevant phrasing and ATS keywords
4. Optimize the professional title for the target role
5. Keep the exact field structure shown above"#;

/// Synthesis user template.
/// Replace: {title}, {required}, {preferred}, {responsibilities}, {ats_keywords},
///          {candidate}, {score}, {skill_scores}, {experience_json}, {confirmed}
pub const SYNTHESIS_TEMPLATE: &str = r#"JOB ANALYSIS
Target role: {title}

Must-have skills:
{required}

Nice-to-have skills:
{preferred}

Key responsibilities:
{responsibilities}

ATS keywords:
{ats_keywords}

CANDIDATE PROFILE
Name: {candidate}
Current score: {score}/100
Skill scores: {skill_scores}
Experience:
{experience_json}

User confirmed skills:
{confirmed}

Generate the optimized résumé JSON."#;
