#![allow(async_fn_in_trait)]

#[macro_use]
extern crate rocket;

use std::sync::Arc;

use bson::doc;
use error::BackendError;
use mongodb::Client;
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::AdHoc;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::context::Context;
use crate::error::ConfigurationError;
use crate::mail::SmtpMailer;
use crate::media::Cloudinary;
use crate::route::mount_api;
use crate::store::mongo::MongoStore;

pub mod config;
pub mod context;
pub mod data;
pub mod duration;
pub mod error;
pub mod mail;
pub mod media;
pub mod resp;
pub mod role;
pub mod route;
pub mod store;
pub mod util;

#[cfg(test)]
pub mod testing;

pub async fn create(log_level: Option<Level>) -> Result<Rocket<Build>, BackendError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder().with_max_level(l).finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
    let client = Client::with_uri_str(c.mongodb_uri.as_str()).await?;

    tracing::info!("Using MongoDB database: {}", c.mongodb_db);
    let db = client.database(c.mongodb_db.as_str());
    if let Err(e) = db.run_command(doc! { "ping": 1 }, None).await {
        tracing::error!("Unable to connect to MongoDB.");
        return Err(e.into());
    }

    let mut ctx = Context::new(Arc::new(MongoStore::new(db)));
    match &c.media {
        Some(media) => {
            tracing::info!("Uploading media to cloud '{}'", media.cloud_name);
            ctx = ctx.with_media(Arc::new(Cloudinary::new(media.clone())));
        }
        None => tracing::warn!("Media host isn't configured, uploads will fail."),
    }
    match &c.mail {
        Some(mail) => {
            tracing::info!("Sending mail through {}:{}", mail.host, mail.port);
            ctx = ctx.with_mailer(Arc::new(SmtpMailer::new(mail)?));
        }
        None => tracing::warn!("Mail isn't configured, notifications are skipped."),
    }

    tracing::info!("Starting HTTP server...");
    let r = build(c, ctx)?.attach(AdHoc::on_shutdown("MongoDB", move |_| {
        Box::pin(async move {
            tracing::info!("Closing MongoDB connections...");
            client.shutdown().await;
        })
    }));

    Ok(r)
}

/// Assembles the server around already constructed services.
pub fn build(c: Config, ctx: Context) -> Result<Rocket<Build>, BackendError> {
    tracing::info!("Setting up CORS for: {:?}", c.cors_origins);
    let allowed_origins = AllowedOrigins::some_exact(&c.cors_origins);

    let cors = rocket_cors::CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Put, Method::Post, Method::Delete]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()?;

    let limits = Limits::default()
        .limit("file", 100.mebibytes())
        .limit("data-form", 110.mebibytes())
        .limit("json", 1.mebibytes());
    let figment = rocket::Config::figment().merge(("limits", limits));

    let r = rocket::custom(figment).manage(c).manage(ctx).attach(cors);
    Ok(mount_api(r))
}
