use anyhow::Result;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use cohort_types::Course;

use crate::db::row::{get_bool, get_timestamp, get_uuid};
use crate::db::DbPool;

pub struct CourseRepository {
    pool: DbPool,
}

impl CourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Course> {
        Ok(Course {
            id: get_uuid(row, 0)?,
            instructor_id: get_uuid(row, 1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            is_published: get_bool(row, 4)?,
            created_at: get_timestamp(row, 5)?,
        })
    }

    /// Get a course by ID
    pub fn get_by_id(&self, course_id: &Uuid) -> Result<Option<Course>> {
        let conn = self.pool.get()?;
        let course = conn
            .query_row(
                "SELECT id, instructor_id, title, description, is_published, created_at
                 FROM courses WHERE id = ?",
                [course_id.to_string()],
                Self::map_row,
            )
            .optional()?;
        Ok(course)
    }

    /// Get all courses taught by an instructor, newest first
    pub fn get_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, instructor_id, title, description, is_published, created_at
             FROM courses
             WHERE instructor_id = ?
             ORDER BY created_at DESC",
        )?;

        let courses = stmt
            .query_map([instructor_id.to_string()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(courses)
    }

    /// Whether the course exists and is taught by the given instructor
    pub fn is_taught_by(&self, course_id: &Uuid, instructor_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM courses WHERE id = ? AND instructor_id = ?",
            (course_id.to_string(), instructor_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{seeded_db, DEVON, LAUNCHPAD_COURSE, MAYA};

    #[test]
    fn test_is_taught_by() {
        let db = seeded_db();
        let repo = CourseRepository::new(db.pool.clone());

        assert!(repo.is_taught_by(&LAUNCHPAD_COURSE, &MAYA).unwrap());
        assert!(!repo.is_taught_by(&LAUNCHPAD_COURSE, &DEVON).unwrap());
        assert!(!repo.is_taught_by(&Uuid::new_v4(), &MAYA).unwrap());
    }

    #[test]
    fn test_get_by_instructor_newest_first() {
        let db = seeded_db();
        let repo = CourseRepository::new(db.pool.clone());

        let courses = repo.get_by_instructor(&MAYA).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].title, "Video Editing for Educators");
        assert!(!courses[0].is_published);
        assert_eq!(
            repo.get_by_id(&LAUNCHPAD_COURSE).unwrap().unwrap().title,
            "Creator Launchpad"
        );
    }
}
