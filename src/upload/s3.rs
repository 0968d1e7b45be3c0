//! Upload through the Internet Archive's S3-like API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::path::{Path, PathBuf};

use super::{FileUploadResult, Uploader};
use crate::metadata::{FieldValue, UploadMetadata};
use crate::runtime::Runtime;

pub const DEFAULT_S3_ENDPOINT: &str = "https://s3.us.archive.org";

const ACCESS_KEY_VAR: &str = "IA_ACCESS_KEY";
const SECRET_KEY_VAR: &str = "IA_SECRET_KEY";

/// Key pair for the archive's S3 API.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl S3Credentials {
    /// Read `IA_ACCESS_KEY` / `IA_SECRET_KEY`. Both must be set.
    pub fn from_env<R: Runtime>(runtime: &R) -> Option<Self> {
        let access_key = runtime.env_var(ACCESS_KEY_VAR).ok()?;
        let secret_key = runtime.env_var(SECRET_KEY_VAR).ok()?;
        Some(Self {
            access_key,
            secret_key,
        })
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"*********")
            .finish()
    }
}

pub struct IaS3Uploader {
    client: Client,
    endpoint: String,
    credentials: Option<S3Credentials>,
}

impl IaS3Uploader {
    pub fn new(client: Client, endpoint: Option<String>, credentials: Option<S3Credentials>) -> Self {
        let endpoint = endpoint
            .unwrap_or_else(|| DEFAULT_S3_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        if credentials.is_none() {
            warn!(
                "{} / {} not set, uploads will be unauthenticated",
                ACCESS_KEY_VAR, SECRET_KEY_VAR
            );
        }
        Self {
            client,
            endpoint,
            credentials,
        }
    }

    fn request_headers(&self, metadata: &UploadMetadata) -> Result<HeaderMap> {
        let mut headers = metadata_headers(metadata)?;
        headers.insert("x-archive-auto-make-bucket", HeaderValue::from_static("1"));
        if let Some(creds) = &self.credentials {
            let mut auth_value = HeaderValue::from_str(&format!(
                "LOW {}:{}",
                creds.access_key, creds.secret_key
            ))
            .context("Invalid characters in archive credentials")?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
        }
        Ok(headers)
    }

    fn file_url(&self, identifier: &str, file: &Path) -> Result<String> {
        let name = file
            .file_name()
            .with_context(|| format!("No file name in {}", file.display()))?;
        Ok(format!(
            "{}/{}/{}",
            self.endpoint,
            identifier,
            urlencoding::encode(&name.to_string_lossy())
        ))
    }

    async fn put_file(&self, identifier: &str, file: &Path, headers: HeaderMap) -> Result<u16> {
        let url = self.file_url(identifier, file)?;
        let handle = tokio::fs::File::open(file)
            .await
            .with_context(|| format!("Failed to open {}", file.display()))?;
        let size = handle
            .metadata()
            .await
            .with_context(|| format!("Failed to stat {}", file.display()))?
            .len();

        info!("Uploading {} ({} bytes) to {}...", file.display(), size, url);

        let response = self
            .client
            .put(&url)
            .headers(headers)
            .header(CONTENT_LENGTH, size)
            .body(handle)
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", file.display()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Upload of {} answered {}: {}", file.display(), status, body);
        }
        Ok(status.as_u16())
    }
}

#[async_trait]
impl Uploader for IaS3Uploader {
    #[tracing::instrument(skip(self, files, metadata))]
    async fn upload(
        &self,
        identifier: &str,
        files: &[PathBuf],
        metadata: &UploadMetadata,
    ) -> Result<Vec<FileUploadResult>> {
        let headers = self.request_headers(metadata)?;

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let status = self.put_file(identifier, file, headers.clone()).await?;
            results.push(FileUploadResult {
                file: file.clone(),
                status,
            });
        }
        Ok(results)
    }
}

/// `x-archive-meta-*` headers for `metadata`. List fields get one numbered
/// header per element (`x-archive-meta00-subject`, `x-archive-meta01-subject`, ...).
pub fn metadata_headers(metadata: &UploadMetadata) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in metadata.fields() {
        match value {
            FieldValue::Single(value) => {
                append_meta(&mut headers, &format!("x-archive-meta-{}", name), value)?;
            }
            FieldValue::List(values) => {
                for (i, value) in values.iter().filter(|v| !v.is_empty()).enumerate() {
                    append_meta(&mut headers, &format!("x-archive-meta{:02}-{}", i, name), value)?;
                }
            }
        }
    }
    Ok(headers)
}

fn append_meta(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .with_context(|| format!("Invalid metadata header name {}", name))?;
    let value = HeaderValue::from_str(&encode_meta_value(value))
        .with_context(|| format!("Invalid value for metadata header {}", name))?;
    headers.append(name, value);
    Ok(())
}

/// Header values must be plain ASCII; anything else travels as `uri(...)`
/// with percent-encoding, which the archive decodes.
fn encode_meta_value(value: &str) -> String {
    let needs_quote = value
        .chars()
        .any(|c| !c.is_ascii() || c.is_ascii_whitespace() || c.is_ascii_control());
    if needs_quote {
        format!("uri({})", urlencoding::encode(value))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArchiveConfig;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use tempfile::tempdir;

    fn sample_metadata() -> UploadMetadata {
        let mut meta = UploadMetadata::base(&ArchiveConfig::default(), "tool");
        meta.rights = Some("License: MIT".to_string());
        meta
    }

    #[test]
    fn test_encode_meta_value() {
        assert_eq!(encode_meta_value("software"), "software");
        assert_eq!(encode_meta_value("Arch Linux"), "uri(Arch%20Linux)");
        assert_eq!(encode_meta_value("a\nb"), "uri(a%0Ab)");
        assert_eq!(encode_meta_value("café"), "uri(caf%C3%A9)");
    }

    #[test]
    fn test_metadata_headers() {
        let headers = metadata_headers(&sample_metadata()).unwrap();
        assert_eq!(headers["x-archive-meta00-collection"], "archlinuxarchive");
        assert_eq!(headers["x-archive-meta-mediatype"], "software");
        assert_eq!(headers["x-archive-meta00-subject"], "archlinux");
        assert_eq!(headers["x-archive-meta01-subject"], "uri(archlinux%20package)");
        assert_eq!(headers["x-archive-meta02-subject"], "tool");
        assert_eq!(headers["x-archive-meta-rights"], "uri(License%3A%20MIT)");
        assert!(!headers.contains_key("x-archive-meta-description"));
    }

    #[test]
    fn test_credentials_from_env() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(ACCESS_KEY_VAR))
            .returning(|_| Ok("access".to_string()));
        runtime
            .expect_env_var()
            .with(eq(SECRET_KEY_VAR))
            .returning(|_| Ok("secret".to_string()));

        let creds = S3Credentials::from_env(&runtime).unwrap();
        assert_eq!(creds.access_key, "access");
        assert!(!format!("{:?}", creds).contains("secret\""));
    }

    #[test]
    fn test_credentials_need_both_keys() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(ACCESS_KEY_VAR))
            .returning(|_| Ok("access".to_string()));
        runtime
            .expect_env_var()
            .with(eq(SECRET_KEY_VAR))
            .returning(|_| Err(std::env::VarError::NotPresent));

        assert_eq!(S3Credentials::from_env(&runtime), None);
    }

    #[test]
    fn test_file_url_encodes_name() {
        let uploader = IaS3Uploader::new(Client::new(), Some("http://s3.test/".into()), None);
        let url = uploader
            .file_url("archlinux_pkg_libc__", Path::new("/p/libc++-1.0-1-x86_64.pkg.tar.xz"))
            .unwrap();
        assert_eq!(
            url,
            "http://s3.test/archlinux_pkg_libc__/libc%2B%2B-1.0-1-x86_64.pkg.tar.xz"
        );
    }

    #[tokio::test]
    async fn test_upload_reports_per_file_status() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempdir().unwrap();
        let good = dir.path().join("tool-1.0-1-x86_64.pkg.tar.xz");
        let bad = dir.path().join("tool-1.0-1-x86_64.pkg.tar.xz.sig");
        std::fs::write(&good, b"package bytes").unwrap();
        std::fs::write(&bad, b"signature").unwrap();

        let mock_good = server
            .mock("PUT", "/archlinux_pkg_tool/tool-1.0-1-x86_64.pkg.tar.xz")
            .match_header("authorization", "LOW key:secret")
            .match_header("x-archive-auto-make-bucket", "1")
            .match_header("x-archive-meta-mediatype", "software")
            .match_header("x-archive-meta02-subject", "tool")
            .match_body("package bytes")
            .with_status(200)
            .create_async()
            .await;
        let mock_bad = server
            .mock("PUT", "/archlinux_pkg_tool/tool-1.0-1-x86_64.pkg.tar.xz.sig")
            .with_status(503)
            .create_async()
            .await;

        let uploader = IaS3Uploader::new(
            Client::new(),
            Some(server.url()),
            Some(S3Credentials {
                access_key: "key".into(),
                secret_key: "secret".into(),
            }),
        );
        let results = uploader
            .upload(
                "archlinux_pkg_tool",
                &[good.clone(), bad.clone()],
                &sample_metadata(),
            )
            .await
            .unwrap();

        mock_good.assert_async().await;
        mock_bad.assert_async().await;
        assert_eq!(
            results,
            vec![
                FileUploadResult {
                    file: good,
                    status: 200
                },
                FileUploadResult {
                    file: bad,
                    status: 503
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails_whole_call() {
        let uploader = IaS3Uploader::new(Client::new(), Some("http://127.0.0.1:9".into()), None);
        let result = uploader
            .upload(
                "archlinux_pkg_tool",
                &[PathBuf::from("/nonexistent/tool.pkg.tar.xz")],
                &sample_metadata(),
            )
            .await;

        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to open"));
    }
}
