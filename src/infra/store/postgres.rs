//! Postgres schema and statements for the enrollment tables.
//!
//! Schema only: this crate ships no Postgres [`crate::core::EnrollmentStore`]
//! implementation. The integration layer owns the client and runs these
//! statements inside one transaction per offering, `LOCK_OFFERING` first.

/// Postgres schema definition for a relational [`crate::core::EnrollmentStore`].
pub struct PostgresSchema;

impl PostgresSchema {
    /// Migration statements. Both (student, offering) constraints are permanent.
    pub fn migrations() -> &'static [&'static str] {
        &[
            r"
CREATE TABLE IF NOT EXISTS course_offerings (
    offering_id BIGINT PRIMARY KEY,
    section_id BIGINT NOT NULL,
    section_default_capacity INT NOT NULL CHECK (section_default_capacity >= 1),
    capacity_override INT,
    strategy TEXT NOT NULL DEFAULT 'none' CHECK (strategy IN ('none', 'section'))
);
",
            r"
CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id UUID PRIMARY KEY,
    student_id BIGINT NOT NULL,
    offering_id BIGINT NOT NULL REFERENCES course_offerings (offering_id),
    status TEXT NOT NULL CHECK (status IN ('pending', 'active', 'dropped', 'completed', 'failed')),
    enrolled_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    dropped_at TIMESTAMPTZ,
    completed_at TIMESTAMPTZ,
    drop_reason TEXT,
    CONSTRAINT uq_enrollments_student_offering UNIQUE (student_id, offering_id)
);
CREATE INDEX IF NOT EXISTS idx_enrollments_offering_status ON enrollments (offering_id, status);
",
            r"
CREATE TABLE IF NOT EXISTS enrollment_waitlist (
    entry_id UUID PRIMARY KEY,
    student_id BIGINT NOT NULL,
    offering_id BIGINT NOT NULL REFERENCES course_offerings (offering_id),
    position INT NOT NULL,
    added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_waitlist_student_offering UNIQUE (student_id, offering_id),
    CONSTRAINT uq_waitlist_offering_position UNIQUE (offering_id, position)
);
",
        ]
    }

    /// Per-offering exclusive lock taken first in every admission transaction.
    pub const LOCK_OFFERING: &'static str =
        "SELECT capacity_override, section_default_capacity FROM course_offerings \
         WHERE offering_id = $1 FOR UPDATE";

    /// Occupancy under the lock.
    pub const COUNT_OCCUPYING: &'static str =
        "SELECT COUNT(*) FROM enrollments \
         WHERE offering_id = $1 AND status IN ('pending', 'active')";

    /// Batch insert that tolerates the (student, offering) constraint.
    pub const INSERT_ENROLLMENT_IGNORING_CONFLICT: &'static str =
        "INSERT INTO enrollments (enrollment_id, student_id, offering_id, status) \
         VALUES ($1, $2, $3, $4) ON CONFLICT (student_id, offering_id) DO NOTHING";

    /// Next waitlist position under the lock.
    pub const NEXT_POSITION: &'static str =
        "SELECT COALESCE(MAX(position), 0) + 1 FROM enrollment_waitlist WHERE offering_id = $1";

    /// Lowest-position entry under the lock.
    pub const WAITLIST_HEAD: &'static str =
        "SELECT entry_id, student_id, position FROM enrollment_waitlist \
         WHERE offering_id = $1 ORDER BY position ASC LIMIT 1";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_constraints_present() {
        let sql = PostgresSchema::migrations().concat();
        assert!(sql.contains("UNIQUE (student_id, offering_id)"));
        assert!(sql.contains("UNIQUE (offering_id, position)"));
        assert_eq!(sql.matches("UNIQUE (student_id, offering_id)").count(), 2);
    }

    #[test]
    fn test_lock_statement_is_exclusive() {
        assert!(PostgresSchema::LOCK_OFFERING.ends_with("FOR UPDATE"));
        assert!(PostgresSchema::INSERT_ENROLLMENT_IGNORING_CONFLICT.contains("DO NOTHING"));
    }
}
