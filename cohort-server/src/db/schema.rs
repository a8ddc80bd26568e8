/// SQL schema for the Cohort database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Profiles (instructors and students)
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    avatar_url TEXT,
    role TEXT NOT NULL CHECK(role IN ('instructor', 'student')),
    created_at TEXT NOT NULL
);

-- Instructor details (tenant scoping most data)
CREATE TABLE IF NOT EXISTS instructors (
    profile_id TEXT PRIMARY KEY,
    headline TEXT,
    bio TEXT,
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- Courses
CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY,
    instructor_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    is_published INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    FOREIGN KEY (instructor_id) REFERENCES instructors(profile_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_courses_instructor ON courses(instructor_id);

-- Lessons
CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY,
    course_id TEXT NOT NULL,
    title TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    video_url TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
);

-- Enrollments
CREATE TABLE IF NOT EXISTS enrollments (
    course_id TEXT NOT NULL,
    student_id TEXT NOT NULL,
    enrolled_at TEXT NOT NULL,
    PRIMARY KEY (course_id, student_id),
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
    FOREIGN KEY (student_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- Reviews
CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    course_id TEXT NOT NULL,
    student_id TEXT NOT NULL,
    rating INTEGER NOT NULL CHECK(rating BETWEEN 1 AND 5),
    body TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE,
    FOREIGN KEY (student_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- Community feed posts
CREATE TABLE IF NOT EXISTS community_posts (
    id TEXT PRIMARY KEY,
    instructor_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    course_id TEXT,
    category TEXT NOT NULL DEFAULT 'discussion'
        CHECK(category IN ('general', 'discussion', 'announcement', 'question', 'resource')),
    title TEXT,
    content TEXT NOT NULL,
    image_urls TEXT NOT NULL DEFAULT '[]',
    video_url TEXT,
    is_pinned INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0 CHECK(like_count >= 0),
    comment_count INTEGER NOT NULL DEFAULT 0 CHECK(comment_count >= 0),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_community_posts_created_at ON community_posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_community_posts_instructor ON community_posts(instructor_id);

-- One like per profile per post
CREATE TABLE IF NOT EXISTS post_likes (
    post_id TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (post_id, profile_id),
    FOREIGN KEY (post_id) REFERENCES community_posts(id) ON DELETE CASCADE,
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

-- Comments on feed posts
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES community_posts(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);

-- Scheduled live calls
CREATE TABLE IF NOT EXISTS meetings (
    id TEXT PRIMARY KEY,
    instructor_id TEXT NOT NULL,
    course_id TEXT,
    title TEXT NOT NULL,
    starts_at TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL DEFAULT 60,
    join_url TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (instructor_id) REFERENCES instructors(profile_id) ON DELETE CASCADE,
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE SET NULL
);

-- Communities
CREATE TABLE IF NOT EXISTS communities (
    id TEXT PRIMARY KEY,
    instructor_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    course_id TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (instructor_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_communities_instructor ON communities(instructor_id);

-- Messages posted inside a community
CREATE TABLE IF NOT EXISTS community_messages (
    id TEXT PRIMARY KEY,
    community_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (community_id) REFERENCES communities(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_community_messages_community
    ON community_messages(community_id, created_at);

-- Community membership
CREATE TABLE IF NOT EXISTS community_members (
    community_id TEXT NOT NULL,
    profile_id TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'member' CHECK(role IN ('owner', 'member')),
    joined_at TEXT NOT NULL,
    PRIMARY KEY (community_id, profile_id),
    FOREIGN KEY (community_id) REFERENCES communities(id) ON DELETE CASCADE,
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_community_members_profile ON community_members(profile_id);

-- Sessions
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_profile_id ON sessions(profile_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Development data: two instructors, two students, their courses,
/// a handful of feed posts and one community with messages.
pub const TEST_DATA: &str = r#"
-- ============================================================================
-- PROFILES
-- ============================================================================
INSERT OR IGNORE INTO profiles (id, full_name, email, avatar_url, role, created_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'Maya Okafor', 'maya@cohort.dev', NULL, 'instructor', '2024-01-01T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'Devon Reyes', 'devon@cohort.dev', NULL, 'instructor', '2024-01-02T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'Sam Lindqvist', 'sam@cohort.dev', NULL, 'student', '2024-01-03T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', 'Priya Natarajan', 'priya@cohort.dev', NULL, 'student', '2024-01-04T00:00:00.000000Z');

INSERT OR IGNORE INTO instructors (profile_id, headline, bio) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'Creator coach', 'Helping educators ship their first course.'),
    ('550e8400-e29b-41d4-a716-446655440002', 'Audio producer', 'Podcasts, voice and sound design.');

-- ============================================================================
-- COURSES
-- ============================================================================
INSERT OR IGNORE INTO courses (id, instructor_id, title, description, is_published, created_at) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'Creator Launchpad', 'Plan, record and launch an online course.', 1, '2024-01-05T00:00:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', 'Video Editing for Educators', NULL, 0, '2024-01-06T00:00:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440002', 'Podcasting 101', 'From first episode to weekly show.', 1, '2024-01-07T00:00:00.000000Z');

INSERT OR IGNORE INTO enrollments (course_id, student_id, enrolled_at) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', '2024-01-08T00:00:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440004', '2024-01-08T00:00:00.000000Z');

-- ============================================================================
-- FEED POSTS
-- ============================================================================
INSERT OR IGNORE INTO community_posts (id, instructor_id, author_id, course_id, category, title, content, image_urls, video_url, is_pinned, like_count, comment_count, created_at, updated_at) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', '750e8400-e29b-41d4-a716-446655440001', 'announcement', 'Welcome!', 'Welcome to the Launchpad community. Introduce yourself below.', '[]', NULL, 1, 1, 1, '2024-01-10T09:00:00.000000Z', '2024-01-10T09:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', NULL, 'resource', 'Lighting on a budget', 'My three-light setup for under $100.', '[]', 'https://www.youtube.com/watch?v=dQw4w9WgXcQ', 0, 0, 0, '2024-01-11T15:30:00.000000Z', '2024-01-11T15:30:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', '750e8400-e29b-41d4-a716-446655440003', 'question', NULL, 'Which microphone are you all using for interviews?', '[]', NULL, 0, 0, 0, '2024-01-12T12:00:00.000000Z', '2024-01-12T12:00:00.000000Z');

INSERT OR IGNORE INTO post_likes (post_id, profile_id, created_at) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', '2024-01-10T10:00:00.000000Z');

INSERT OR IGNORE INTO comments (id, post_id, author_id, content, created_at) VALUES
    ('a50e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', 'Hi all, excited to be here!', '2024-01-10T10:05:00.000000Z');

-- ============================================================================
-- COMMUNITIES
-- ============================================================================
INSERT OR IGNORE INTO communities (id, instructor_id, name, description, course_id, is_active, created_at, updated_at) VALUES
    ('850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'Launchpad Cohort', 'Weekly accountability for Launchpad students.', '750e8400-e29b-41d4-a716-446655440001', 1, '2024-01-09T00:00:00.000000Z', '2024-01-09T00:00:00.000000Z');

INSERT OR IGNORE INTO community_members (community_id, profile_id, role, joined_at) VALUES
    ('850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'owner', '2024-01-09T00:00:00.000000Z'),
    ('850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', 'member', '2024-01-09T08:00:00.000000Z');

INSERT OR IGNORE INTO community_messages (id, community_id, author_id, content, created_at, updated_at) VALUES
    ('950e8400-e29b-41d4-a716-446655440001', '850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'Share one goal for this week.', '2024-01-09T09:00:00.000000Z', '2024-01-09T09:00:00.000000Z'),
    ('950e8400-e29b-41d4-a716-446655440002', '850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', 'Finish my course outline!', '2024-01-09T09:30:00.000000Z', '2024-01-09T09:30:00.000000Z');

-- ============================================================================
-- MEETINGS
-- ============================================================================
INSERT OR IGNORE INTO meetings (id, instructor_id, course_id, title, starts_at, duration_minutes, join_url, created_at) VALUES
    ('b50e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', '750e8400-e29b-41d4-a716-446655440001', 'Launchpad office hours', '2024-01-15T17:00:00.000000Z', 60, NULL, '2024-01-09T00:00:00.000000Z');
"#;
