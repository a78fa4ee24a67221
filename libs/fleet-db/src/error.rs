//! Error taxonomy shared by every DAO.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors surfaced by DAO operations.
///
/// Storage errors are carried opaquely in [`DaoError::Db`]; the only translation
/// performed locally is "zero rows where exactly one was expected" into
/// [`DaoError::NotFound`].
#[derive(Debug, Error)]
pub enum DaoError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("batch size {size} exceeds maximum allowed {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("invalid order by field '{field}' for {entity}")]
    InvalidOrderBy { entity: &'static str, field: String },

    #[error("invalid relation '{relation}' for {entity}")]
    InvalidRelation {
        entity: &'static str,
        relation: String,
    },

    #[error("page limit must be greater than zero")]
    InvalidLimit,

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl DaoError {
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for unique and foreign-key violations reported by the driver.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Db(err) => matches!(
                err.sql_err(),
                Some(SqlErr::UniqueConstraintViolation(_) | SqlErr::ForeignKeyConstraintViolation(_))
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_message_names_both_sizes() {
        let err = DaoError::BatchTooLarge { size: 101, max: 100 };
        assert_eq!(err.to_string(), "batch size 101 exceeds maximum allowed 100");
    }

    #[test]
    fn not_found_is_distinguished() {
        let err = DaoError::not_found("Machine", "m-1");
        assert!(err.is_not_found());
        assert!(!err.is_constraint_violation());
        assert_eq!(err.to_string(), "Machine not found: m-1");

        let db = DaoError::from(DbErr::Custom("boom".to_owned()));
        assert!(!db.is_not_found());
        assert!(!db.is_constraint_violation());
    }
}
