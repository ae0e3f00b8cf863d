//! Pure rules for posts: edit permission and display formatting.

use time::{Date, OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::domain::entities::{AuthorRecord, PostRecord};

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// A post may be edited by its author and nobody else. The author field is
/// immutable once set, so this is a plain identity comparison.
pub fn can_edit(post: &PostRecord, author: &AuthorRecord) -> bool {
    post.author_id == author.id
}

/// Listing order: newest first, with the id as a tiebreak so pages stay
/// stable when two posts share a timestamp. The Postgres repository encodes
/// the same rule as `ORDER BY p.published_at DESC, p.id DESC`; any
/// alternative store must sort by this function.
pub fn listing_order(a: &PostRecord, b: &PostRecord) -> std::cmp::Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then(b.id.cmp(&a.id))
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT).expect("valid calendar date")
}

/// The first line of a post body, bounded for card display.
pub fn body_preview(body: &str, max_chars: usize) -> String {
    let first_line = body.lines().next().unwrap_or_default();
    let mut preview: String = first_line.chars().take(max_chars).collect();
    if preview.chars().count() < first_line.chars().count() {
        preview.push('…');
    }
    preview
}

pub fn published_date(post: &PostRecord) -> Date {
    post.published_at.date()
}

/// Post bodies must carry visible content.
pub fn validate_body(body: &str) -> Result<(), crate::domain::error::DomainError> {
    if body.trim().is_empty() {
        return Err(crate::domain::error::DomainError::validation(
            "post body must not be empty",
        ));
    }
    Ok(())
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn post(author_id: Uuid) -> PostRecord {
        let when = datetime!(2024-03-01 12:00 UTC);
        PostRecord {
            id: Uuid::new_v4(),
            body_text: "hello".to_string(),
            published_at: when,
            author_id,
            group_id: None,
            created_at: when,
            updated_at: when,
        }
    }

    fn author(id: Uuid, username: &str) -> AuthorRecord {
        AuthorRecord {
            id,
            username: username.to_string(),
            created_at: datetime!(2024-01-01 0:00 UTC),
        }
    }

    #[test]
    fn author_may_edit_own_post() {
        let id = Uuid::new_v4();
        assert!(can_edit(&post(id), &author(id, "leo")));
    }

    #[test]
    fn other_authors_may_not_edit() {
        let post = post(Uuid::new_v4());
        assert!(!can_edit(&post, &author(Uuid::new_v4(), "anna")));
    }

    #[test]
    fn listing_order_is_newest_first_with_id_tiebreak() {
        let author_id = Uuid::new_v4();
        let newer = post(author_id);
        let mut older = post(author_id);
        older.published_at -= time::Duration::hours(1);

        let mut posts = vec![older.clone(), newer.clone()];
        posts.sort_by(listing_order);
        assert_eq!(posts[0].id, newer.id);
        assert_eq!(posts[1].id, older.id);

        let mut tied = post(author_id);
        tied.published_at = newer.published_at;
        let expected_first = newer.id.max(tied.id);
        let mut posts = vec![newer, tied];
        posts.sort_by(listing_order);
        assert_eq!(posts[0].id, expected_first);
    }

    #[test]
    fn preview_keeps_short_first_line() {
        assert_eq!(body_preview("short post\nsecond line", 40), "short post");
    }

    #[test]
    fn preview_truncates_with_ellipsis() {
        assert_eq!(body_preview("abcdef", 3), "abc…");
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(validate_body("   \n").is_err());
        assert!(validate_body("text").is_ok());
    }

    #[test]
    fn human_date_formatting() {
        assert_eq!(
            format_human_date(datetime!(2024-03-01 12:00 UTC).date()),
            "March 1, 2024"
        );
    }
}
