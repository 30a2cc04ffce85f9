use std::sync::Arc;

use rocket::http::Status;

use crate::mail::{Email, Mailer};
use crate::media::{MediaFile, MediaHost, UploadedMedia};
use crate::resp::problem::Problem;
use crate::store::Store;

/// Services shared by every request, built at startup and managed by Rocket.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn Store>,
    pub media: Option<Arc<dyn MediaHost>>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("media", &self.media.is_some())
            .field("mailer", &self.mailer.is_some())
            .finish()
    }
}

impl Context {
    pub fn new(store: Arc<dyn Store>) -> Context {
        Context {
            store,
            media: None,
            mailer: None,
        }
    }

    pub fn with_media(mut self, media: Arc<dyn MediaHost>) -> Context {
        self.media = Some(media);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Context {
        self.mailer = Some(mailer);
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, Problem> {
        let media = self.media.as_ref().ok_or_else(|| {
            Problem::new_untyped(
                Status::InternalServerError,
                "Media uploads aren't configured.",
            )
        })?;
        Ok(media.upload(file).await?)
    }

    /// Sends the email if a mailer is configured. Failures are logged only.
    pub async fn notify(&self, email: Email) {
        let mailer = match &self.mailer {
            Some(it) => it,
            None => {
                tracing::debug!("mail isn't configured, skipping '{}'", email.subject);
                return;
            }
        };
        let to = email.to.clone();
        if let Err(e) = mailer.send(email).await {
            tracing::warn!("unable to send email to {}: {}", to, e);
        }
    }
}
