use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use mockall::Sequence;
use s3_deploy_core::contract::{MockObjectStore, StoreError, WebsiteConfig};
use s3_deploy_core::{deploy, DeployConfig, DeployError};
use tempfile::{tempdir, TempDir};

/// A small site: `index.html` plus `css/site.css`.
fn site_fixture() -> TempDir {
    let dir = tempdir().expect("temp dir");
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("index.html"), "<h1>hello</h1>").unwrap();
    fs::write(dir.path().join("css/site.css"), "body { margin: 0 }").unwrap();
    dir
}

fn config_for(site: &Path) -> DeployConfig {
    DeployConfig {
        access_key: Some("AKIAEXAMPLE".into()),
        secret_key: Some("secret".into()),
        bucket: "site_bucket".into(),
        source: format!("{}/**/*", site.display()),
        strip_prefix: site.display().to_string(),
        target: "/web".into(),
        ..DeployConfig::default()
    }
}

#[tokio::test]
async fn creates_missing_bucket_and_waits_before_uploading() {
    let site = site_fixture();
    let config = DeployConfig {
        create_bucket: true,
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    let mut seq = Sequence::new();
    store
        .expect_list_buckets()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(vec!["other".to_string(), "site-bucket-old".to_string()]));
    store
        .expect_create_bucket()
        .withf(|bucket: &str| bucket == "site-bucket")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    store
        .expect_wait_until_bucket_exists()
        .withf(|bucket: &str| bucket == "site-bucket")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    store
        .expect_put_object()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    let report = deploy(&config, &store)
        .await
        .expect("deploy should succeed");

    assert!(report.bucket_created);
    assert_eq!(report.bucket, "site-bucket");
    assert_eq!(report.uploaded.len(), 2);
}

#[tokio::test]
async fn existing_bucket_is_not_created_again() {
    let site = site_fixture();
    let config = DeployConfig {
        create_bucket: true,
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_list_buckets()
        .times(1)
        .returning(|| Ok(vec!["site-bucket".to_string()]));
    store.expect_create_bucket().never();
    store.expect_wait_until_bucket_exists().never();
    store.expect_put_object().times(2).returning(|_| Ok(()));

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert!(!report.bucket_created);
}

#[tokio::test]
async fn missing_credentials_without_verified_pipeline_makes_no_store_calls() {
    let site = site_fixture();
    let config = DeployConfig {
        access_key: None,
        secret_key: None,
        yaml_verified: false,
        create_bucket: true,
        hosting: true,
        ..config_for(site.path())
    };

    // No expectations: any call on the mock panics.
    let store = MockObjectStore::new();

    let err = deploy(&config, &store).await.unwrap_err();
    assert!(
        matches!(err, DeployError::Configuration(_)),
        "expected a security error, got: {err:?}"
    );
}

#[tokio::test]
async fn verified_pipeline_may_deploy_without_static_credentials() {
    let site = site_fixture();
    let config = DeployConfig {
        access_key: None,
        secret_key: None,
        yaml_verified: true,
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store.expect_put_object().times(2).returning(|_| Ok(()));

    assert!(deploy(&config, &store).await.is_ok());
}

#[tokio::test]
async fn hosting_without_index_document_writes_empty_configuration() {
    let site = site_fixture();
    let config = DeployConfig {
        hosting: true,
        index_document: String::new(),
        error_document: "404.html".into(),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_get_bucket_website()
        .times(1)
        .returning(|_| Err(StoreError::NotConfigured));
    store
        .expect_put_bucket_website()
        .withf(|bucket: &str, website: &WebsiteConfig| {
            bucket == "site-bucket"
                && website.index_document.is_none()
                && website.error_document.is_none()
        })
        .times(1)
        .returning(|_, _| Ok(()));
    store.expect_put_object().times(2).returning(|_| Ok(()));

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert_eq!(
        report.website_url.as_deref(),
        Some("site-bucket.s3-website.us-east-1.amazonaws.com")
    );
}

#[tokio::test]
async fn hosting_writes_index_and_error_documents_and_reports_regional_url() {
    let site = site_fixture();
    let config = DeployConfig {
        hosting: true,
        region: "eu-west-3".into(),
        index_document: "index.html".into(),
        error_document: "404.html".into(),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store.expect_get_bucket_website().returning(|_| {
        Ok(WebsiteConfig {
            index_document: Some("old.html".into()),
            error_document: None,
        })
    });
    store
        .expect_put_bucket_website()
        .withf(|_, website: &WebsiteConfig| {
            website.index_document.as_deref() == Some("index.html")
                && website.error_document.as_deref() == Some("404.html")
        })
        .times(1)
        .returning(|_, _| Ok(()));
    store.expect_put_object().times(2).returning(|_| Ok(()));

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert_eq!(
        report.website_url.as_deref(),
        Some("site-bucket.s3-website.eu-west-3.amazonaws.com")
    );
}

#[tokio::test]
async fn website_failures_do_not_abort_uploads() {
    let site = site_fixture();
    let config = DeployConfig {
        hosting: true,
        index_document: "index.html".into(),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_get_bucket_website()
        .returning(|_| Err(StoreError::Service("AccessDenied".into())));
    store
        .expect_put_bucket_website()
        .times(1)
        .returning(|_, _| Err(StoreError::Service("AccessDenied".into())));
    store.expect_put_object().times(2).returning(|_| Ok(()));

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert_eq!(report.website_url, None);
    assert_eq!(report.uploaded.len(), 2);
}

#[tokio::test]
async fn uploads_carry_key_acl_content_type_and_encryption() {
    let site = site_fixture();
    let config = DeployConfig {
        acl: "public-read".into(),
        encryption: Some("AES256".into()),
        ..config_for(site.path())
    };

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    let mut store = MockObjectStore::new();
    store.expect_put_object().times(2).returning(move |record| {
        recorder.lock().unwrap().push((
            record.bucket.clone(),
            record.key.clone(),
            record.content_type.clone(),
            record.acl.clone(),
            record.encryption.clone(),
        ));
        Ok(())
    });

    deploy(&config, &store).await.expect("deploy should succeed");

    let mut seen = seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            (
                "site-bucket".to_string(),
                "/web/css/site.css".to_string(),
                "text/css".to_string(),
                "public-read".to_string(),
                Some("AES256".to_string()),
            ),
            (
                "site-bucket".to_string(),
                "/web/index.html".to_string(),
                "text/html".to_string(),
                "public-read".to_string(),
                Some("AES256".to_string()),
            ),
        ]
    );
}

#[tokio::test]
async fn empty_encryption_omits_the_header() {
    let site = site_fixture();
    let config = DeployConfig {
        encryption: Some(String::new()),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .withf(|record| record.encryption.is_none())
        .times(2)
        .returning(|_| Ok(()));

    deploy(&config, &store).await.expect("deploy should succeed");
}

#[tokio::test]
async fn excluded_files_are_not_uploaded() {
    let site = site_fixture();
    let config = DeployConfig {
        exclude: vec![format!("{}/css/*", site.path().display())],
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .withf(|record| record.key == "/web/index.html")
        .times(1)
        .returning(|_| Ok(()));

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.uploaded[0].content_type, "text/html");
}

#[tokio::test]
async fn failed_upload_aborts_the_run() {
    let site = site_fixture();
    let config = DeployConfig {
        // two plain files, no directories
        source: format!("{}/**/*.*", site.path().display()),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .times(1)
        .returning(|_| Err(StoreError::Service("SlowDown".into())));

    let err = deploy(&config, &store).await.unwrap_err();
    match err {
        DeployError::PutObject { key, .. } => assert!(key.starts_with("/web/")),
        other => panic!("expected PutObject error, got {other:?}"),
    }
}

#[tokio::test]
async fn list_buckets_failure_aborts_before_uploads() {
    let site = site_fixture();
    let config = DeployConfig {
        create_bucket: true,
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_list_buckets()
        .returning(|| Err(StoreError::Service("InvalidAccessKeyId".into())));
    store.expect_put_object().never();

    let err = deploy(&config, &store).await.unwrap_err();
    assert!(matches!(err, DeployError::ListBuckets(_)));
}

#[tokio::test]
async fn create_bucket_failure_aborts() {
    let site = site_fixture();
    let config = DeployConfig {
        create_bucket: true,
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store.expect_list_buckets().returning(|| Ok(vec![]));
    store
        .expect_create_bucket()
        .returning(|_| Err(StoreError::Service("BucketAlreadyExists".into())));
    store.expect_wait_until_bucket_exists().never();
    store.expect_put_object().never();

    let err = deploy(&config, &store).await.unwrap_err();
    match err {
        DeployError::CreateBucket { bucket, .. } => assert_eq!(bucket, "site-bucket"),
        other => panic!("expected CreateBucket error, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_failure_aborts() {
    let site = site_fixture();
    let config = DeployConfig {
        create_bucket: true,
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store.expect_list_buckets().returning(|| Ok(vec![]));
    store.expect_create_bucket().returning(|_| Ok(()));
    store
        .expect_wait_until_bucket_exists()
        .returning(|_| Err(StoreError::Service("exceeded max wait time".into())));
    store.expect_put_object().never();

    let err = deploy(&config, &store).await.unwrap_err();
    assert!(matches!(err, DeployError::WaitForBucket { .. }));
}

#[tokio::test]
async fn dry_run_uploads_nothing() {
    let site = site_fixture();
    let config = DeployConfig {
        dry_run: true,
        ..config_for(site.path())
    };

    // No expectations: any call on the mock panics.
    let store = MockObjectStore::new();

    let report = deploy(&config, &store).await.expect("dry run should succeed");
    assert!(report.uploaded.is_empty());
}

#[tokio::test]
async fn dry_run_still_provisions_and_configures_hosting() {
    let site = site_fixture();
    let config = DeployConfig {
        dry_run: true,
        create_bucket: true,
        hosting: true,
        index_document: "index.html".into(),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    let mut seq = Sequence::new();
    store
        .expect_list_buckets()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(Vec::new()));
    store
        .expect_create_bucket()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    store
        .expect_wait_until_bucket_exists()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    store
        .expect_get_bucket_website()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(StoreError::NotConfigured));
    store
        .expect_put_bucket_website()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    store.expect_put_object().never();

    let report = deploy(&config, &store).await.expect("dry run should succeed");
    assert!(report.bucket_created);
    assert_eq!(
        report.website_url.as_deref(),
        Some("site-bucket.s3-website.us-east-1.amazonaws.com")
    );
    assert!(report.uploaded.is_empty());
}

#[tokio::test]
async fn invalid_source_glob_fails_before_uploads() {
    let site = site_fixture();
    let config = DeployConfig {
        source: format!("{}/***", site.path().display()),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store.expect_put_object().never();

    let err = deploy(&config, &store).await.unwrap_err();
    assert!(matches!(err, DeployError::Glob { .. }));
}

#[tokio::test]
async fn no_matching_files_is_not_an_error() {
    let site = site_fixture();
    let config = DeployConfig {
        source: format!("{}/**/*.pdf", site.path().display()),
        ..config_for(site.path())
    };

    let store = MockObjectStore::new();

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert!(report.uploaded.is_empty());
}

#[tokio::test]
async fn branch_bucket_name_is_used_by_every_stage() {
    let site = site_fixture();
    let config = DeployConfig {
        bucket: "preview".into(),
        append_branch: true,
        commit_branch: "feature/New_UI".into(),
        branch_prefix_strip: "feature/".into(),
        create_bucket: true,
        hosting: true,
        index_document: "index.html".into(),
        ..config_for(site.path())
    };

    let mut store = MockObjectStore::new();
    store.expect_list_buckets().returning(|| Ok(vec![]));
    store
        .expect_create_bucket()
        .withf(|bucket: &str| bucket == "preview-new-ui")
        .returning(|_| Ok(()));
    store
        .expect_wait_until_bucket_exists()
        .withf(|bucket: &str| bucket == "preview-new-ui")
        .returning(|_| Ok(()));
    store
        .expect_get_bucket_website()
        .withf(|bucket: &str| bucket == "preview-new-ui")
        .returning(|_| Err(StoreError::NotConfigured));
    store
        .expect_put_bucket_website()
        .withf(|bucket: &str, _| bucket == "preview-new-ui")
        .returning(|_, _| Ok(()));
    store
        .expect_put_object()
        .withf(|record| record.bucket == "preview-new-ui")
        .times(2)
        .returning(|_| Ok(()));

    let report = deploy(&config, &store).await.expect("deploy should succeed");
    assert_eq!(report.bucket, "preview-new-ui");
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_file_aborts_before_later_uploads() {
    use s3_deploy_core::upload::upload_files;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().expect("temp dir");
    let first = dir.path().join("a.txt");
    let locked = dir.path().join("b.txt");
    let last = dir.path().join("c.txt");
    for path in [&first, &locked, &last] {
        fs::write(path, "content").unwrap();
    }
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&locked).is_ok() {
        // Permission bits are not enforced for privileged users.
        return;
    }

    let config = DeployConfig {
        strip_prefix: dir.path().display().to_string(),
        ..config_for(dir.path())
    };

    let mut store = MockObjectStore::new();
    store
        .expect_put_object()
        .withf(|record| record.key == "/web/a.txt")
        .times(1)
        .returning(|_| Ok(()));

    let matches = vec![first, locked.clone(), last];
    let err = upload_files(&store, &config, "site-bucket", &matches)
        .await
        .unwrap_err();

    match err {
        DeployError::FileOpen { path, .. } => assert_eq!(path, locked),
        other => panic!("expected a file open error, got: {other:?}"),
    }
}
