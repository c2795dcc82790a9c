/// Email notifications for issue reporters
/// Uses lettre for SMTP delivery; sends are fire-and-forget from the intake
/// pipeline so a slow or down mail server never delays a submission.
use anyhow::{anyhow, Result};
use lettre::message::header::ContentType;
use lettre::transport::smtp::SmtpTransport;
use lettre::{Message, Transport};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl EmailConfig {
    pub fn from_env() -> Result<Self> {
        Ok(EmailConfig {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port: std::env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@civicpulse.app".to_string()),
            from_name: std::env::var("FROM_NAME")
                .unwrap_or_else(|_| "CivicPulse".to_string()),
        })
    }

    /// Sends are skipped entirely when no SMTP credentials are configured
    pub fn configured(&self) -> bool {
        !self.smtp_username.is_empty() && !self.smtp_password.is_empty()
    }
}

pub struct EmailService {
    config: Arc<EmailConfig>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        EmailService {
            config: Arc::new(config),
        }
    }

    fn create_transport(&self) -> Result<SmtpTransport> {
        let creds = lettre::transport::smtp::authentication::Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let mailer = SmtpTransport::starttls_relay(&self.config.smtp_host)
            .map_err(|e| anyhow!("Failed to build SMTP transport: {}", e))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        Ok(mailer)
    }

    /// Confirm to the reporter that their issue was accepted and scored
    pub fn send_issue_confirmation(
        &self,
        to_email: &str,
        to_name: &str,
        issue_title: &str,
        priority: &str,
        score: i32,
    ) -> Result<()> {
        if !self.config.configured() {
            tracing::debug!("SMTP not configured, skipping confirmation email");
            return Ok(());
        }

        let html = format!(
            r#"
            <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
                <h2 style="color: #3b82f6;">CivicPulse Report Received</h2>
                <p>Hi {to_name},</p>
                <p>Your report "<strong>{issue_title}</strong>" has been accepted.</p>
                <p>Assigned priority: <strong>{priority}</strong> (score {score}/100)</p>
                <p>We will notify the responsible department. Thank you for helping your city.</p>
                <hr style="margin: 30px 0; border: none; border-top: 1px solid #e5e7eb;">
                <p style="color: #6b7280; font-size: 12px;">CivicPulse - Smart City Issue Reporting</p>
            </div>
            "#
        );

        let message = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| anyhow!("Invalid from address: {}", e))?,
            )
            .to(format!("{} <{}>", to_name, to_email)
                .parse()
                .map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject("CivicPulse - Your issue report was received")
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        let mailer = self.create_transport()?;
        mailer
            .send(&message)
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(username: &str, password: &str) -> EmailConfig {
        EmailConfig {
            smtp_host: "localhost".into(),
            smtp_port: 587,
            smtp_username: username.into(),
            smtp_password: password.into(),
            from_email: "noreply@civicpulse.app".into(),
            from_name: "CivicPulse".into(),
        }
    }

    #[test]
    fn test_configured_requires_credentials() {
        assert!(!config("", "").configured());
        assert!(!config("user", "").configured());
        assert!(config("user", "pass").configured());
    }

    #[test]
    fn test_unconfigured_send_is_noop() {
        let service = EmailService::new(config("", ""));
        assert!(service
            .send_issue_confirmation("a@example.com", "Asha", "Pothole", "High", 80)
            .is_ok());
    }
}
