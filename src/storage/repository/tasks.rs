// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Student-task rows and the approval state machine.
//!
//! Status gates when a payout may occur: only a task in `teacher_approved`
//! is eligible, and a successful payout advances it to
//! `validator_approved`. Transitions are validated here so no caller can
//! skip or reverse a step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{RecordStore, StorageError, StorageResult};

/// Approval state of one task assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    Completed,
    TeacherApproved,
    ValidatorApproved,
    RejectedByTeacher,
    RejectedByValidator,
}

impl TaskStatus {
    /// Whether the machine allows moving from `self` to `next`.
    ///
    /// Linear progression `assigned → completed → teacher_approved →
    /// validator_approved`, with rejection branches out of `completed` and
    /// `teacher_approved`. Terminal states admit nothing.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Assigned, Completed)
                | (Completed, TeacherApproved)
                | (Completed, RejectedByTeacher)
                | (TeacherApproved, ValidatorApproved)
                | (TeacherApproved, RejectedByValidator)
        )
    }
}

/// One assignment of a task to a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentTaskRecord {
    /// Stable assignment identifier.
    pub student_task_id: String,
    /// Student this assignment belongs to.
    pub student_id: String,
    /// Underlying task, when known.
    pub task_id: Option<String>,
    /// Current approval state.
    pub status: TaskStatus,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl StudentTaskRecord {
    pub fn new(student_task_id: &str, student_id: &str, status: TaskStatus) -> Self {
        Self {
            student_task_id: student_task_id.to_string(),
            student_id: student_id.to_string(),
            task_id: None,
            status,
            updated_at: Utc::now(),
        }
    }
}

/// Repository for student-task rows.
pub struct StudentTaskRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> StudentTaskRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn get(&self, student_task_id: &str) -> StorageResult<StudentTaskRecord> {
        let path = self.store.paths().student_task(student_task_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "student task {student_task_id}"
            )));
        }
        self.store.read_json(path)
    }

    pub fn create(&self, record: &StudentTaskRecord) -> StorageResult<()> {
        let path = self.store.paths().student_task(&record.student_task_id);
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "student task {}",
                record.student_task_id
            )));
        }
        self.store.write_json(path, record)
    }

    /// Atomically advance a task from `expected` to `next`.
    ///
    /// Fails when the row is no longer in `expected` (a concurrent caller
    /// won) or when the machine forbids the step.
    pub fn transition(
        &self,
        student_task_id: &str,
        expected: TaskStatus,
        next: TaskStatus,
    ) -> StorageResult<()> {
        let path = self.store.paths().student_task(student_task_id);
        self.store
            .mutate_json::<StudentTaskRecord, ()>(path, |task| {
                if task.status != expected {
                    return Err(StorageError::InvalidState(format!(
                        "student task {student_task_id} is {:?}, expected {expected:?}",
                        task.status
                    )));
                }
                if !expected.can_transition_to(next) {
                    return Err(StorageError::InvalidState(format!(
                        "illegal transition {expected:?} -> {next:?}"
                    )));
                }
                task.status = next;
                task.updated_at = Utc::now();
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;

    fn test_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = RecordStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize");
        (dir, store)
    }

    #[test]
    fn state_machine_allows_only_forward_steps() {
        use TaskStatus::*;

        assert!(Assigned.can_transition_to(Completed));
        assert!(Completed.can_transition_to(TeacherApproved));
        assert!(Completed.can_transition_to(RejectedByTeacher));
        assert!(TeacherApproved.can_transition_to(ValidatorApproved));
        assert!(TeacherApproved.can_transition_to(RejectedByValidator));

        // No skips, reversals, or exits from terminal states.
        assert!(!Assigned.can_transition_to(TeacherApproved));
        assert!(!Assigned.can_transition_to(ValidatorApproved));
        assert!(!Completed.can_transition_to(ValidatorApproved));
        assert!(!ValidatorApproved.can_transition_to(TeacherApproved));
        assert!(!RejectedByTeacher.can_transition_to(Completed));
        assert!(!RejectedByValidator.can_transition_to(TeacherApproved));
    }

    #[test]
    fn transition_advances_matching_row() {
        let (_dir, store) = test_store();
        let repo = StudentTaskRepository::new(&store);

        repo.create(&StudentTaskRecord::new(
            "st-1",
            "stu-1",
            TaskStatus::TeacherApproved,
        ))
        .unwrap();

        repo.transition("st-1", TaskStatus::TeacherApproved, TaskStatus::ValidatorApproved)
            .unwrap();
        assert_eq!(repo.get("st-1").unwrap().status, TaskStatus::ValidatorApproved);
    }

    #[test]
    fn transition_rejects_unexpected_current_state() {
        let (_dir, store) = test_store();
        let repo = StudentTaskRepository::new(&store);

        repo.create(&StudentTaskRecord::new("st-1", "stu-1", TaskStatus::Completed))
            .unwrap();

        let err = repo
            .transition("st-1", TaskStatus::TeacherApproved, TaskStatus::ValidatorApproved)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));
        assert_eq!(repo.get("st-1").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn transition_rejects_illegal_step() {
        let (_dir, store) = test_store();
        let repo = StudentTaskRepository::new(&store);

        repo.create(&StudentTaskRecord::new("st-1", "stu-1", TaskStatus::Assigned))
            .unwrap();

        let err = repo
            .transition("st-1", TaskStatus::Assigned, TaskStatus::ValidatorApproved)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));
    }
}
