use serde::{Deserialize, Serialize};

/// Topical category of a feed post. Pinning is tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    General,
    #[default]
    Discussion,
    Announcement,
    Question,
    Resource,
}

impl PostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostCategory::General => "general",
            PostCategory::Discussion => "discussion",
            PostCategory::Announcement => "announcement",
            PostCategory::Question => "question",
            PostCategory::Resource => "resource",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "general" => Some(PostCategory::General),
            "discussion" => Some(PostCategory::Discussion),
            "announcement" => Some(PostCategory::Announcement),
            "question" => Some(PostCategory::Question),
            "resource" => Some(PostCategory::Resource),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedSort {
    #[default]
    Newest,
    PinnedFirst,
}

impl FeedSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::Newest => "newest",
            FeedSort::PinnedFirst => "pinned_first",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "newest" => Some(FeedSort::Newest),
            "pinned_first" => Some(FeedSort::PinnedFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Instructor,
    Student,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Instructor => "instructor",
            ProfileRole::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "instructor" => Some(ProfileRole::Instructor),
            "student" => Some(ProfileRole::Student),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MemberRole::Owner),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoProvider {
    YouTube,
    Loom,
}

impl VideoProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoProvider::YouTube => "youtube",
            VideoProvider::Loom => "loom",
        }
    }
}

/// Outcome of a custom-domain verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Connected,
    DnsPending,
    SslPending,
    Unreachable,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Connected => "connected",
            DomainStatus::DnsPending => "dns_pending",
            DomainStatus::SslPending => "ssl_pending",
            DomainStatus::Unreachable => "unreachable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!(PostCategory::parse("Announcement"), Some(PostCategory::Announcement));
        assert_eq!(PostCategory::parse(" question "), Some(PostCategory::Question));
        assert_eq!(PostCategory::parse("pinned"), None);
    }

    #[test]
    fn test_feed_sort_default_is_newest() {
        assert_eq!(FeedSort::default(), FeedSort::Newest);
        assert_eq!(FeedSort::parse("pinned_first"), Some(FeedSort::PinnedFirst));
    }
}
