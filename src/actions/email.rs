use super::context::ActionContext;
use crate::email::templates;
use crate::email::OutgoingEmail;
use crate::error::ActionError;
use crate::models::ServerAction;

pub async fn send_verification_email(
    ctx: &ActionContext,
    action: &ServerAction,
    job_history_id: &str,
) -> Result<String, ActionError> {
    let job = ctx.db.get_job_history(job_history_id).await?;

    let to = job.verifier_email().ok_or_else(|| {
        ActionError::InvalidRecord(format!(
            "Verifier email is missing for job history ID: {job_history_id}"
        ))
    })?;

    let mailer = ctx.mailer.as_ref().ok_or(ActionError::EmailNotConfigured)?;

    let (html, text) = templates::render_verification(&job).map_err(ActionError::Delivery)?;

    let email = OutgoingEmail {
        to: to.to_string(),
        subject: templates::VERIFICATION_SUBJECT.to_string(),
        html,
        text,
        reference: Some(format!("server-action-{}-{}", action.id, action.attempts)),
    };

    tracing::info!("Sending verification email to {to} for job history {job_history_id}");

    let message_id = mailer.send(&email).await.map_err(ActionError::Delivery)?;

    Ok(match message_id {
        Some(id) => format!("Verification email sent to {to} (message id {id})"),
        None => format!("Verification email sent to {to}"),
    })
}
