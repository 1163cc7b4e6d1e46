use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;

/// Object storage for project images.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;

    /// Public prefix every stored object is served under, without trailing slash.
    fn public_base(&self) -> &str;

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base().trim_end_matches('/'), key)
    }

    /// Storage key for a URL served from this bucket, `None` for foreign URLs.
    fn managed_key(&self, url: &str) -> Option<String> {
        let base = self.public_base().trim_end_matches('/');
        let rest = url.strip_prefix(base)?.strip_prefix('/')?;
        let key = rest.split(['?', '#']).next().unwrap_or_default();
        (!key.is_empty()).then(|| key.to_string())
    }
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_base: cfg.public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    fn public_base(&self) -> &str {
        &self.public_base
    }
}

#[cfg(test)]
pub mod fake {
    use std::sync::Mutex;

    use super::*;

    /// Records every call instead of talking to S3.
    #[derive(Default)]
    pub struct FakeStorage {
        pub puts: Mutex<Vec<(String, String, String)>>, // key, content type, cache control
        pub deletes: Mutex<Vec<String>>,
        pub fail_deletes: bool,
    }

    #[async_trait]
    impl StorageClient for FakeStorage {
        async fn put_object(
            &self,
            key: &str,
            _body: Bytes,
            content_type: &str,
            cache_control: &str,
        ) -> anyhow::Result<()> {
            self.puts.lock().unwrap().push((
                key.to_string(),
                content_type.to_string(),
                cache_control.to_string(),
            ));
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.deletes.lock().unwrap().push(key.to_string());
            if self.fail_deletes {
                anyhow::bail!("delete refused");
            }
            Ok(())
        }

        fn public_base(&self) -> &str {
            "https://storage.test/project-images"
        }
    }
}
