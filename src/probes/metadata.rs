//! File version-metadata collaborator.
//!
//! Descriptive version-resource fields (copyright, product/file
//! version, company, product name) are read through the platform's
//! version-info API. The classifier only cares whether any of them is
//! present; the raw company/product strings ride along for the report.

use crate::core::types::{FileMetadata, Outcome};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

/// File metadata queries, batched by the metadata filtering pass.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    /// Query descriptive metadata for one executable.
    async fn query_file_metadata(&self, path: &Path) -> Outcome<FileMetadata>;
}

/// Raw JSON shape produced by the version-info query.
#[derive(Debug, Deserialize)]
pub(crate) struct RawVersionInfo {
    #[serde(rename = "HasCopyright", default)]
    has_copyright: bool,
    #[serde(rename = "HasProductVersion", default)]
    has_product_version: bool,
    #[serde(rename = "HasFileVersion", default)]
    has_file_version: bool,
    #[serde(rename = "HasCompanyName", default)]
    has_company_name: bool,
    #[serde(rename = "HasProductName", default)]
    has_product_name: bool,
    #[serde(rename = "CompanyName", default)]
    company_name: Option<String>,
    #[serde(rename = "ProductName", default)]
    product_name: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
}

/// Parse the version-info JSON into a metadata outcome.
pub(crate) fn parse_version_info(json: &str) -> Outcome<FileMetadata> {
    let raw: RawVersionInfo = match serde_json::from_str(json.trim()) {
        Ok(raw) => raw,
        Err(e) => {
            return Outcome::Failed {
                kind: format!("unparseable version info: {}", e),
            }
        }
    };

    if let Some(err) = raw.error {
        return Outcome::Failed { kind: err };
    }

    Outcome::Ok(FileMetadata {
        has_copyright: raw.has_copyright,
        has_product_version: raw.has_product_version,
        has_file_version: raw.has_file_version,
        has_company_name: raw.has_company_name,
        has_product_name: raw.has_product_name,
        company_name: raw.company_name.filter(|s| !s.trim().is_empty()),
        product_name: raw.product_name.filter(|s| !s.trim().is_empty()),
    })
}

/// Real implementation backed by the platform version-info API.
#[derive(Debug, Default, Clone)]
pub struct VersionInfoProbe;

impl VersionInfoProbe {
    pub fn new() -> Self {
        Self
    }

    #[cfg(windows)]
    fn build_command(path: &Path) -> String {
        format!(
            r#"try {{
  $file = Get-Item -LiteralPath "{}" -ErrorAction Stop;
  $v = [System.Diagnostics.FileVersionInfo]::GetVersionInfo($file.FullName);
  @{{
    HasCopyright = ![string]::IsNullOrWhiteSpace($v.LegalCopyright);
    HasProductVersion = ![string]::IsNullOrWhiteSpace($v.ProductVersion);
    HasFileVersion = ![string]::IsNullOrWhiteSpace($v.FileVersion);
    HasCompanyName = ![string]::IsNullOrWhiteSpace($v.CompanyName);
    HasProductName = ![string]::IsNullOrWhiteSpace($v.ProductName);
    CompanyName = $v.CompanyName;
    ProductName = $v.ProductName;
  }} | ConvertTo-Json -Compress;
}} catch {{
  @{{ Error = $_.Exception.Message }} | ConvertTo-Json -Compress;
}}"#,
            path.display()
        )
    }
}

#[async_trait]
impl MetadataProbe for VersionInfoProbe {
    #[cfg(windows)]
    async fn query_file_metadata(&self, path: &Path) -> Outcome<FileMetadata> {
        let output = tokio::process::Command::new("powershell")
            .args(["-Command", &Self::build_command(path)])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                parse_version_info(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => Outcome::Failed {
                kind: format!(
                    "version info query exited with {}",
                    out.status.code().unwrap_or(-1)
                ),
            },
            Err(e) => Outcome::Failed {
                kind: format!("failed to spawn version info query: {}", e),
            },
        }
    }

    #[cfg(not(windows))]
    async fn query_file_metadata(&self, _path: &Path) -> Outcome<FileMetadata> {
        Outcome::Degraded {
            reason: "version metadata unavailable on this platform".to_string(),
        }
    }
}
