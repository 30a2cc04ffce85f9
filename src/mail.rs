//! Transactional email over SMTP.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::error::MailError;

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[rocket::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<SmtpMailer, MailError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?.port(config.port);

        if let (Some(user), Some(pass)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(SmtpMailer {
            transport: builder.build(),
            from: format!("StudyNotion <{}>", config.from),
        })
    }
}

#[rocket::async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(email.to.parse()?)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(message).await?;
        tracing::info!("email sent");
        Ok(())
    }
}

pub mod templates {
    use super::Email;

    pub fn course_enrollment(to: &str, course_name: &str, student_name: &str) -> Email {
        Email {
            to: to.to_string(),
            subject: format!("Successfully Enrolled into {}", course_name),
            html: format!(
                "<!DOCTYPE html>\
                <html><body style=\"font-family: Arial, sans-serif; text-align: center;\">\
                <h2>Course Registration Confirmation</h2>\
                <p>Dear {student},</p>\
                <p>You have successfully registered for the course <b>\"{course}\"</b>. \
                Please log in to your learning dashboard to access the course materials \
                and start your learning journey.</p>\
                <p>If you have any questions, please reach out to us at \
                info@studynotion.com.</p>\
                </body></html>",
                student = student_name,
                course = course_name,
            ),
        }
    }
}
