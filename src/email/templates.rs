use askama::Template;
use chrono::Datelike;

use crate::models::JobHistory;

pub const VERIFICATION_SUBJECT: &str = "[Zero ID] Please verify candidate's past employment";

const MISSING_FIELD: &str = "N/A";
const MISSING_DESCRIPTION: &str = "No additional description provided.";
const DEFAULT_MESSAGE: &str = "A candidate has requested employment verification.";

/// Field values shared by the HTML and plain-text bodies, with placeholders
/// already substituted.
#[derive(Debug, Clone)]
pub struct VerificationDetails {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub message: String,
    pub year: i32,
}

impl VerificationDetails {
    pub fn from_job(job: &JobHistory, year: i32) -> Self {
        Self {
            company: or_placeholder(&job.company_name, MISSING_FIELD),
            title: or_placeholder(&job.job_title, MISSING_FIELD),
            start_date: or_placeholder(&job.start_date, MISSING_FIELD),
            end_date: or_placeholder(&job.end_date, MISSING_FIELD),
            description: or_placeholder(&job.description, MISSING_DESCRIPTION),
            message: or_placeholder(&job.verification_message, DEFAULT_MESSAGE),
            year,
        }
    }
}

fn or_placeholder(value: &Option<String>, placeholder: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

#[derive(Template)]
#[template(path = "verification_email.html")]
struct VerificationHtml<'a> {
    d: &'a VerificationDetails,
}

#[derive(Template)]
#[template(path = "verification_email.txt")]
struct VerificationText<'a> {
    d: &'a VerificationDetails,
}

/// Render the (html, text) bodies of the verification request.
pub fn render_verification(job: &JobHistory) -> Result<(String, String), String> {
    let details = VerificationDetails::from_job(job, chrono::Utc::now().year());
    render_details(&details)
}

pub fn render_details(details: &VerificationDetails) -> Result<(String, String), String> {
    let html = VerificationHtml { d: details }
        .render()
        .map_err(|e| format!("Failed to render HTML body: {e}"))?;
    let text = VerificationText { d: details }
        .render()
        .map_err(|e| format!("Failed to render text body: {e}"))?;
    Ok((html, text))
}
