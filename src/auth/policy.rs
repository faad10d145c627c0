//! The single place where role-based access is decided. Handlers never check
//! roles inline; they name the operation and ask.

use crate::auth::claims::Role;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadStudents,
    CreateStudent,
    UpdateStudent,
    DeleteStudent,
    ReadCourses,
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    ReadEnrollments,
    Enroll,
    DeleteEnrollment,
    RegisterUser,
}

pub fn authorize(role: Role, op: Operation) -> Result<(), ApiError> {
    use Operation::*;
    let allowed = match (role, op) {
        // destructive entity deletes and operator registration are admin-only
        (Role::Admin, DeleteStudent | DeleteCourse | RegisterUser) => true,
        (Role::Teacher, DeleteStudent | DeleteCourse | RegisterUser) => false,
        // reads, creates, updates, and enrollment management are open to
        // every authenticated role
        (
            _,
            ReadStudents | CreateStudent | UpdateStudent | ReadCourses | CreateCourse
            | UpdateCourse | ReadEnrollments | Enroll | DeleteEnrollment,
        ) => true,
    };
    if allowed {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_may_do_everything() {
        use Operation::*;
        for op in [
            ReadStudents,
            CreateStudent,
            UpdateStudent,
            DeleteStudent,
            ReadCourses,
            CreateCourse,
            UpdateCourse,
            DeleteCourse,
            ReadEnrollments,
            Enroll,
            DeleteEnrollment,
            RegisterUser,
        ] {
            assert!(authorize(Role::Admin, op).is_ok(), "admin denied {:?}", op);
        }
    }

    #[test]
    fn teacher_may_read_write_but_not_delete_entities() {
        use Operation::*;
        for op in [
            ReadStudents,
            CreateStudent,
            UpdateStudent,
            ReadCourses,
            CreateCourse,
            UpdateCourse,
            ReadEnrollments,
            Enroll,
            DeleteEnrollment,
        ] {
            assert!(authorize(Role::Teacher, op).is_ok(), "teacher denied {:?}", op);
        }
    }

    #[test]
    fn teacher_is_forbidden_admin_operations() {
        use Operation::*;
        for op in [DeleteStudent, DeleteCourse, RegisterUser] {
            let err = authorize(Role::Teacher, op).unwrap_err();
            assert!(matches!(err, ApiError::Forbidden), "teacher allowed {:?}", op);
        }
    }
}
