use crate::application::repos::RepoError;

/// Classify a sqlx error against the gazette schema. Constraint violations a
/// request can trip at runtime (a post submitted against a vanished author or
/// group) come back as invalid input; anything else constraint-shaped is an
/// integrity error.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) => match db.constraint() {
            Some(constraint) => classify_constraint(constraint, db.message()),
            None => RepoError::from_persistence(db.message()),
        },
        other => RepoError::from_persistence(other),
    }
}

fn classify_constraint(constraint: &str, message: &str) -> RepoError {
    match constraint {
        "posts_author_id_fkey" | "posts_group_id_fkey" => RepoError::InvalidInput {
            message: format!("post references a missing row (`{constraint}`)"),
        },
        // authors_username_key / groups_slug_key: authors and groups are not
        // written through this service, so tripping one means the store was
        // seeded inconsistently.
        _ => RepoError::Integrity {
            message: format!("constraint `{constraint}` violated: {message}"),
        },
    }
}
