use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::repo::{PgUserRepo, UserRepo},
    config::AppConfig,
    contacts::repo::{ContactRepo, PgContactRepo},
    mail::{self, MailClient},
    storage::{LocalStorage, StorageClient},
};

/// URL prefix under which stored avatars are served.
pub const AVATAR_URL_PREFIX: &str = "avatars";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub contacts: Arc<dyn ContactRepo>,
    pub mailer: Arc<dyn MailClient>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    /// Connects to the database and wires the production adapters.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let mailer: Arc<dyn MailClient> = Arc::from(mail::from_config(&config.mail)?);
        let storage = Arc::new(LocalStorage::new(
            &config.avatars.public_dir,
            AVATAR_URL_PREFIX,
        )) as Arc<dyn StorageClient>;

        let state = Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgContactRepo::new(db.clone())),
            mailer,
            storage,
        );
        Ok((state, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        contacts: Arc<dyn ContactRepo>,
        mailer: Arc<dyn MailClient>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            config,
            users,
            contacts,
            mailer,
            storage,
        }
    }
}
