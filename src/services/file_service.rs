use crate::config::Config;
use crate::error::{AppError, AppResult};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

pub struct FileService {
    client: Client,
    bucket: String,
    public_url: Option<String>,
}

impl FileService {
    pub async fn new(config: &Config) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.minio_access_key,
            &config.minio_secret_key,
            None,
            None,
            "rentals",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .endpoint_url(&config.minio_endpoint)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.minio_bucket.clone(),
            public_url: config.minio_public_url.clone(),
        })
    }

    pub async fn upload_file(&self, key: &str, content_type: &str, data: Vec<u8>) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::File(e.to_string()))?;

        Ok(self.public_url_for(key))
    }

    pub async fn download_file(&self, key: &str) -> AppResult<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::File(e.to_string()))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| AppError::File(e.to_string()))?;

        Ok(data.into_bytes().to_vec())
    }

    pub async fn delete_file(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::File(e.to_string()))?;

        Ok(())
    }

    /// Удаление без ошибки для вызывающего: запись в БД уже удалена
    pub async fn delete_files_quietly(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.delete_file(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to delete stored object");
            }
        }
    }

    pub fn public_url_for(&self, key: &str) -> String {
        build_public_url(self.public_url.as_deref(), &self.bucket, key)
    }
}

fn build_public_url(public_url: Option<&str>, bucket: &str, key: &str) -> String {
    match public_url {
        Some(base_url) => format!("{}/{}/{}", base_url.trim_end_matches('/'), bucket, key),
        None => format!("/{}/{}", bucket, key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_public_url() {
        assert_eq!(
            build_public_url(Some("https://cdn.example.com/"), "rentals", "apartments/a/b.png"),
            "https://cdn.example.com/rentals/apartments/a/b.png"
        );
        assert_eq!(
            build_public_url(None, "rentals", "apartments/a/b.png"),
            "/rentals/apartments/a/b.png"
        );
    }
}
