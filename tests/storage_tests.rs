use rit_links_in::{
    config::{AppConfig, Env},
    storage::{MockStorageService, S3StorageClient, StorageService, sanitize_key},
};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "profiles/abc/photo.png";
        let url = mock
            .get_presigned_upload_url(key, "image/png")
            .await
            .expect("mock presign failed");

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("photo.png", "image/png").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let url = mock
            .get_presigned_upload_url("../../etc/passwd", "text/plain")
            .await
            .expect("mock presign failed");

        assert!(!url.contains(".."));
        assert!(url.ends_with("mock-bucket/etc/passwd?signature=fake"));
    }

    #[test]
    fn test_mock_public_url_has_no_signature() {
        let mock = MockStorageService::new();
        assert_eq!(
            mock.public_url("profiles/abc/photo.png"),
            "http://localhost:9000/mock-bucket/profiles/abc/photo.png"
        );
    }
}

#[test]
fn test_sanitize_key_drops_traversal_and_empty_segments() {
    assert_eq!(sanitize_key("profiles//a/./b.png"), "profiles/a/b.png");
    assert_eq!(sanitize_key("/../../secret"), "secret");
    assert_eq!(sanitize_key("plain.png"), "plain.png");
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    async fn client() -> S3StorageClient {
        S3StorageClient::new(
            "http://localhost:9000/",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
            "http://localhost:9000/",
        )
        .await
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        let client = client().await;

        // Presigning is a local computation; no server needs to be listening.
        let key = format!("profiles/{}/photo.png", Uuid::new_v4());
        let url = client
            .get_presigned_upload_url(&key, "image/png")
            .await
            .expect("presign failed");

        assert!(url.contains("localhost:9000"));
        assert!(url.contains("testbucket"));
        assert!(url.contains(&key));
    }

    #[tokio::test]
    async fn test_s3_public_url_is_path_style() {
        let client = client().await;
        assert_eq!(
            client.public_url("profiles/u/p.png"),
            "http://localhost:9000/testbucket/profiles/u/p.png"
        );
    }

    #[tokio::test]
    async fn test_s3_public_url_uses_object_api_in_production() {
        let config = production_config();
        let client = S3StorageClient::new(
            &config.s3_endpoint,
            &config.s3_region,
            &config.s3_key,
            &config.s3_secret,
            &config.s3_bucket,
            &config.storage_public_base,
        )
        .await;

        let url = client.public_url("profiles/u/p.png");
        assert_eq!(
            url,
            "https://project.supabase.co/storage/v1/object/public/rit-links-uploads/profiles/u/p.png"
        );
        assert!(!url.contains("/storage/v1/s3/"));
    }

    fn production_config() -> AppConfig {
        AppConfig {
            env: Env::Production,
            supabase_url: Some("https://project.supabase.co".to_string()),
            s3_endpoint: "https://project.supabase.co/storage/v1/s3".to_string(),
            storage_public_base: "https://project.supabase.co/storage/v1/object/public"
                .to_string(),
            s3_region: "stub".to_string(),
            s3_bucket: "rit-links-uploads".to_string(),
            ..AppConfig::default()
        }
    }
}
