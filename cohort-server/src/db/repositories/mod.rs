mod profile_repository;
mod course_repository;
mod post_repository;
mod like_repository;
mod comment_repository;
mod community_repository;
mod message_repository;
mod member_repository;

pub use profile_repository::ProfileRepository;
pub use course_repository::CourseRepository;
pub use post_repository::{FeedFilter, PostRepository, MAX_FEED_LIMIT};
pub use like_repository::LikeRepository;
pub use comment_repository::CommentRepository;
pub use community_repository::CommunityRepository;
pub use message_repository::MessageRepository;
pub use member_repository::MemberRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use uuid::Uuid;

    use cohort_types::{Community, CommunityPost, PostCategory};

    use super::PostRepository;
    use crate::db::Database;

    pub const MAYA: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440001);
    pub const DEVON: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440002);
    pub const SAM: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440003);
    pub const PRIYA: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440004);
    pub const LAUNCHPAD_COURSE: Uuid = Uuid::from_u128(0x750e8400_e29b_41d4_a716_446655440001);
    pub const WELCOME_POST: Uuid = Uuid::from_u128(0x650e8400_e29b_41d4_a716_446655440001);
    pub const LAUNCHPAD_COMMUNITY: Uuid = Uuid::from_u128(0x850e8400_e29b_41d4_a716_446655440001);

    pub fn seeded_db() -> Database {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        db.seed_test_data().expect("Failed to seed test data");
        db
    }

    pub fn insert_post(db: &Database, author: Uuid, category: PostCategory, content: &str) -> CommunityPost {
        let now = Utc::now();
        let post = CommunityPost {
            id: Uuid::new_v4(),
            instructor_id: author,
            author_id: author,
            author_name: String::new(),
            author_avatar_url: None,
            course_id: None,
            category,
            title: None,
            content: content.to_string(),
            image_urls: Vec::new(),
            video_url: None,
            is_pinned: false,
            like_count: 0,
            comment_count: 0,
            viewer_has_liked: false,
            created_at: now,
            updated_at: now,
        };
        PostRepository::new(db.pool.clone())
            .create(&post)
            .expect("Failed to insert post");
        post
    }

    pub fn new_community(instructor: Uuid, name: &str, description: &str) -> Community {
        let now = Utc::now();
        Community {
            id: Uuid::new_v4(),
            instructor_id: instructor,
            name: name.to_string(),
            description: description.to_string(),
            course_id: None,
            course_name: None,
            is_active: true,
            message_count: 0,
            member_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
