//! Release and asset models exchanged with the release store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired state of a release, supplied by the caller before any remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSpec {
    /// Tag name, unique within a repository
    pub tag_name: String,
    /// Commitish the tag is created from when it does not exist yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    /// Release title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Release notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Whether the release stays unpublished
    pub draft: bool,
    /// Whether the release is marked as a prerelease
    pub prerelease: bool,
}

impl ReleaseSpec {
    /// Published, non-prerelease spec for a tag
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            target_commitish: None,
            name: None,
            body: None,
            draft: false,
            prerelease: false,
        }
    }

    /// Copy of this spec that creates a draft
    pub fn as_draft(&self) -> Self {
        Self {
            draft: true,
            ..self.clone()
        }
    }
}

/// A release as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Identifier assigned by the store
    pub id: u64,
    /// Tag name
    pub tag_name: String,
    /// Release title
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the release is unpublished
    #[serde(default)]
    pub draft: bool,
    /// Whether the release is a prerelease
    #[serde(default)]
    pub prerelease: bool,
    /// Asset upload endpoint (URI template, e.g. `.../assets{?name,label}`)
    #[serde(default)]
    pub upload_url: String,
    /// Browser URL of the release page
    #[serde(default)]
    pub html_url: String,
    /// Publication time, absent for drafts
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Assets embedded in list responses
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Sum of download counts across all embedded assets
    pub fn download_count(&self) -> u64 {
        self.assets.iter().map(|asset| asset.download_count).sum()
    }
}

/// A file attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// Identifier assigned by the store
    pub id: u64,
    /// File name, equal to the basename of the uploaded file
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Number of downloads
    #[serde(default)]
    pub download_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_draft_leaves_original_untouched() {
        let spec = ReleaseSpec {
            body: Some("notes".to_string()),
            ..ReleaseSpec::new("v1.0.0")
        };
        let draft = spec.as_draft();

        assert!(draft.draft);
        assert!(!spec.draft);
        assert_eq!(draft.tag_name, spec.tag_name);
        assert_eq!(draft.body, spec.body);
    }

    #[test]
    fn test_release_spec_omits_unset_fields() {
        let json = serde_json::to_value(ReleaseSpec::new("v1")).unwrap();
        assert_eq!(json["tag_name"], "v1");
        assert_eq!(json["draft"], false);
        assert!(json.get("target_commitish").is_none());
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_release_deserializes_github_payload() {
        let payload = r#"{
            "id": 42,
            "tag_name": "v0.2.0",
            "name": null,
            "draft": true,
            "prerelease": false,
            "upload_url": "https://uploads.github.com/repos/o/r/releases/42/assets{?name,label}",
            "html_url": "https://github.com/o/r/releases/tag/v0.2.0",
            "published_at": null,
            "assets": [
                {"id": 1, "name": "a.zip", "size": 10, "download_count": 3},
                {"id": 2, "name": "b.zip", "size": 20, "download_count": 4}
            ]
        }"#;

        let release: Release = serde_json::from_str(payload).unwrap();
        assert_eq!(release.id, 42);
        assert!(release.draft);
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.download_count(), 7);
    }
}
