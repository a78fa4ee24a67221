//! Lifecycle columns shared by every table: id, created, updated, deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait};

/// An entity with server-assigned timestamps and a soft-delete marker.
///
/// Implemented next to each `DeriveEntityModel` so generic code can reach the
/// lifecycle columns without knowing the concrete `Column` enum.
pub trait Audited: EntityTrait {
    const ID: Self::Column;
    const CREATED: Self::Column;
    const UPDATED: Self::Column;
    /// Non-null marks the row logically removed.
    const DELETED: Self::Column;
}

/// Refresh `updated` (and `created` on insert) to the current instant.
///
/// Call from `ActiveModelBehavior::before_save` so every single-row write is
/// stamped without caller discipline.
pub fn stamp<A>(am: &mut A, insert: bool)
where
    A: ActiveModelTrait,
    A::Entity: Audited,
{
    stamp_at(am, Utc::now(), insert);
}

/// Same as [`stamp`] with an explicit instant, for bulk statements that bypass
/// `before_save` and want one timestamp for the whole batch.
pub fn stamp_at<A>(am: &mut A, now: DateTime<Utc>, insert: bool)
where
    A: ActiveModelTrait,
    A::Entity: Audited,
{
    if insert {
        am.set(<A::Entity as Audited>::CREATED, now.into());
    }
    am.set(<A::Entity as Audited>::UPDATED, now.into());
}
