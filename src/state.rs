use std::sync::Arc;

use crate::actions::email::{Mailer, UnconfiguredMailer};
use crate::config::AppConfig;
use crate::inflight::InFlight;
use crate::revalidate::Revalidator;
use crate::storage::{Storage, StorageClient};
use crate::store::{ContentStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ContentStore>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<dyn Mailer>,
    pub revalidator: Revalidator,
    pub inflight: InFlight,
}

impl AppState {
    /// Connects to Postgres, runs migrations and wires the S3 client.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(store.pool()).await?;

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(
            config,
            Arc::new(store),
            storage,
            Arc::new(UnconfiguredMailer),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn ContentStore>,
        storage: Arc<dyn StorageClient>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            store,
            storage,
            mailer,
            revalidator: Revalidator::new(),
            inflight: InFlight::new(),
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> Self {
        Self::fake_with(
            Arc::new(crate::store::MemoryStore::new()),
            Arc::new(crate::storage::fake::FakeStorage::default()),
        )
    }

    pub fn fake_with(
        store: Arc<crate::store::MemoryStore>,
        storage: Arc<crate::storage::fake::FakeStorage>,
    ) -> Self {
        Self::from_parts(
            Arc::new(AppConfig::test()),
            store,
            storage,
            Arc::new(UnconfiguredMailer),
        )
    }

    pub async fn seed_admin(&self, email: &str, password: &str) -> crate::auth::AdminIdentity {
        let hash = crate::auth::password::hash_password(password).unwrap();
        let user = self.store.create_user(email, &hash).await.unwrap();
        crate::auth::AdminIdentity {
            id: user.id,
            email: user.email,
        }
    }

    pub fn access_token(&self, admin: &crate::auth::AdminIdentity) -> String {
        crate::auth::jwt::JwtKeys::from(&self.config.jwt)
            .sign_access(admin.id)
            .unwrap()
    }
}
