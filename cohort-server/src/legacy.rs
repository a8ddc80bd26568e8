//! Codec for the legacy single-table community encoding.
//!
//! Before communities had their own tables, a community was a
//! `community_posts` row titled `[COMMUNITY_METADATA] ...` whose content held
//! the community attributes as JSON, and each message was a row titled
//! `[COMMUNITY:<id>] ...` pointing back at that metadata row. The feed query
//! uses the tags to hide such rows and `cohort-migrate` uses this codec to
//! convert them into first-class rows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const METADATA_TAG: &str = "[COMMUNITY_METADATA]";
pub const MESSAGE_TAG_PREFIX: &str = "[COMMUNITY:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LegacyError {
    #[error("message tag is missing its closing bracket: {0}")]
    UnterminatedTag(String),
    #[error("message tag has an empty community id")]
    EmptyCommunityId,
    #[error("community metadata is not valid JSON: {0}")]
    InvalidMetadata(String),
}

/// What a legacy title encodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyTag<'a> {
    /// A community definition; `label` is whatever followed the tag
    Metadata { label: &'a str },
    /// A message belonging to `community_id`; `rest` is the stripped title
    Message { community_id: &'a str, rest: &'a str },
}

/// Community attributes stored in a metadata row's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Classify a post title. `Ok(None)` means an ordinary feed post.
pub fn classify_title(title: &str) -> Result<Option<LegacyTag<'_>>, LegacyError> {
    if let Some(label) = title.strip_prefix(METADATA_TAG) {
        return Ok(Some(LegacyTag::Metadata { label: label.trim() }));
    }

    let Some(tagged) = title.strip_prefix(MESSAGE_TAG_PREFIX) else {
        return Ok(None);
    };

    let close = tagged
        .find(']')
        .ok_or_else(|| LegacyError::UnterminatedTag(title.to_string()))?;
    let community_id = tagged[..close].trim();
    if community_id.is_empty() {
        return Err(LegacyError::EmptyCommunityId);
    }

    Ok(Some(LegacyTag::Message {
        community_id,
        rest: tagged[close + 1..].trim(),
    }))
}

pub fn parse_metadata(content: &str) -> Result<LegacyMetadata, LegacyError> {
    serde_json::from_str(content).map_err(|e| LegacyError::InvalidMetadata(e.to_string()))
}

pub fn metadata_title(name: &str) -> String {
    format!("{} {}", METADATA_TAG, name)
}

pub fn message_title(community_id: &str, subject: &str) -> String {
    if subject.is_empty() {
        format!("{}{}]", MESSAGE_TAG_PREFIX, community_id)
    } else {
        format!("{}{}] {}", MESSAGE_TAG_PREFIX, community_id, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_titles_are_not_tagged() {
        assert_eq!(classify_title("Welcome!"), Ok(None));
        assert_eq!(classify_title("[COMMUNITY NEWS] hello"), Ok(None));
        assert_eq!(classify_title(""), Ok(None));
    }

    #[test]
    fn test_metadata_title() {
        let title = metadata_title("Launchpad Cohort");
        assert_eq!(
            classify_title(&title),
            Ok(Some(LegacyTag::Metadata { label: "Launchpad Cohort" }))
        );
    }

    #[test]
    fn test_message_title_strips_tag() {
        let title = message_title("8f2c", "Weekly check-in");
        assert_eq!(
            classify_title(&title),
            Ok(Some(LegacyTag::Message {
                community_id: "8f2c",
                rest: "Weekly check-in",
            }))
        );
        assert_eq!(
            classify_title("[COMMUNITY:8f2c]"),
            Ok(Some(LegacyTag::Message { community_id: "8f2c", rest: "" }))
        );
    }

    #[test]
    fn test_malformed_message_tags() {
        assert!(matches!(
            classify_title("[COMMUNITY:8f2c hello"),
            Err(LegacyError::UnterminatedTag(_))
        ));
        assert_eq!(classify_title("[COMMUNITY: ] hi"), Err(LegacyError::EmptyCommunityId));
    }

    #[test]
    fn test_parse_metadata_defaults() {
        let meta = parse_metadata(r#"{"name":"Alumni"}"#).unwrap();
        assert_eq!(meta.name, "Alumni");
        assert!(meta.is_active);
        assert!(meta.course_id.is_none());

        let meta = parse_metadata(
            r#"{"name":"Launchpad","description":"d","course_id":"c1","course_name":"Creator Launchpad","is_active":false}"#,
        )
        .unwrap();
        assert_eq!(meta.course_name.as_deref(), Some("Creator Launchpad"));
        assert!(!meta.is_active);

        assert!(matches!(
            parse_metadata("not json"),
            Err(LegacyError::InvalidMetadata(_))
        ));
    }
}
