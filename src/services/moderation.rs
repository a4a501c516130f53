// src/services/moderation.rs

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::AppError,
    models::{
        crew::{CREW_SELECT, Crew},
        listing::{LISTING_SELECT, MarketplaceListing},
        moderation::{ModeratedKind, ModerationOutcome, ModerationStatus},
        specialist::{SPECIALIST_SELECT, Specialist},
        tender::{TENDER_SELECT, Tender},
    },
    utils::{html::clean_optional, jwt::MaybeUser},
};

/// Who is asking, for visibility decisions on moderated content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer {
    pub id: Option<i64>,
    pub is_admin: bool,
}

impl From<&MaybeUser> for Viewer {
    fn from(user: &MaybeUser) -> Self {
        Self {
            id: user.id(),
            is_admin: user.is_admin(),
        }
    }
}

impl Viewer {
    /// Single-entity visibility: approved is public, the rest only for owner and admins.
    pub fn can_view(&self, status: ModerationStatus, owner_id: i64) -> bool {
        status == ModerationStatus::Approved || self.is_admin || self.id == Some(owner_id)
    }

    /// Whether a list query should skip the `approved` filter.
    ///
    /// Admins may ask for everything with `show_all`; owners filtering on their own
    /// user id see their pending and rejected entries too. `show_all` from anyone else
    /// is ignored.
    pub fn sees_unmoderated(&self, show_all: bool, user_filter: Option<i64>) -> bool {
        (show_all && self.is_admin) || (user_filter.is_some() && user_filter == self.id)
    }
}

/// Appends `AND <alias>.moderation_status = 'approved'` unless the viewer may see more.
/// The builder must already contain a `WHERE` clause.
pub fn push_visibility(
    builder: &mut QueryBuilder<'_, Sqlite>,
    alias: &str,
    viewer: &Viewer,
    show_all: bool,
    user_filter: Option<i64>,
) {
    if !viewer.sees_unmoderated(show_all, user_filter) {
        builder.push(format!(" AND {alias}.moderation_status = "));
        builder.push_bind(ModerationStatus::Approved);
    }
}

/// Everything awaiting moderation of one kind, newest first, as JSON.
pub async fn list_pending(
    pool: &SqlitePool,
    kind: ModeratedKind,
) -> Result<serde_json::Value, AppError> {
    let value = match kind {
        ModeratedKind::Tenders => serde_json::to_value(
            sqlx::query_as::<_, Tender>(&format!(
                "{TENDER_SELECT} WHERE t.moderation_status = 'pending' ORDER BY t.created_at DESC, t.id DESC"
            ))
            .fetch_all(pool)
            .await?,
        )?,
        ModeratedKind::Marketplace => serde_json::to_value(
            sqlx::query_as::<_, MarketplaceListing>(&format!(
                "{LISTING_SELECT} WHERE l.moderation_status = 'pending' ORDER BY l.created_at DESC, l.id DESC"
            ))
            .fetch_all(pool)
            .await?,
        )?,
        ModeratedKind::Specialists => serde_json::to_value(
            sqlx::query_as::<_, Specialist>(&format!(
                "{SPECIALIST_SELECT} WHERE s.moderation_status = 'pending' ORDER BY s.created_at DESC, s.id DESC"
            ))
            .fetch_all(pool)
            .await?,
        )?,
        ModeratedKind::Crews => serde_json::to_value(
            sqlx::query_as::<_, Crew>(&format!(
                "{CREW_SELECT} WHERE c.moderation_status = 'pending' ORDER BY c.created_at DESC, c.id DESC"
            ))
            .fetch_all(pool)
            .await?,
        )?,
    };

    Ok(value)
}

/// Counts pending items of one kind (admin dashboard).
pub async fn count_pending(pool: &SqlitePool, kind: ModeratedKind) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE moderation_status = 'pending'",
        kind.table()
    ))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Records an admin decision on a moderated entity.
///
/// Re-moderation is allowed (an approved listing can later be rejected). The owner is not
/// notified.
pub async fn moderate(
    pool: &SqlitePool,
    kind: ModeratedKind,
    id: i64,
    admin_id: i64,
    status: ModerationStatus,
    comment: Option<String>,
) -> Result<ModerationOutcome, AppError> {
    let outcome = sqlx::query_as::<_, ModerationOutcome>(&format!(
        r#"
        UPDATE {}
        SET moderation_status = ?, moderated_by = ?, moderated_at = CURRENT_TIMESTAMP,
            moderation_comment = ?
        WHERE id = ?
        RETURNING id, moderation_status, moderated_by, moderated_at, moderation_comment
        "#,
        kind.table()
    ))
    .bind(status)
    .bind(admin_id)
    .bind(clean_optional(comment))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound(format!("{} not found", kind.label())))?;

    tracing::info!(
        "Admin {} set {} {} to {}",
        admin_id,
        kind.label(),
        id,
        status.as_str()
    );

    Ok(outcome)
}
