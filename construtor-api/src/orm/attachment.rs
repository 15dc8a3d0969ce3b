//! File attachment metadata. Attachments point at one record of another
//! table through (`entity_type`, `entity_id`).

use chrono::Utc;
use diesel::prelude::*;

use crate::models::{Attachment, AttachmentChanges, AttachmentEntityType, NewAttachment, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

/// Returns the org of the live record an attachment would point at, or
/// `None` when there is no such live record.
pub fn entity_org(
    conn: &mut SqliteConnection,
    kind: AttachmentEntityType,
    target_id: i32,
) -> Result<Option<i32>, diesel::result::Error> {
    use crate::schema::{checklists, equipamentos, expenses, obras, rdos};

    match kind {
        AttachmentEntityType::Obra => obras::table
            .filter(obras::id.eq(target_id))
            .filter(obras::deleted_at.is_null())
            .select(obras::org_id)
            .first::<i32>(conn)
            .optional(),
        AttachmentEntityType::Rdo => rdos::table
            .filter(rdos::id.eq(target_id))
            .filter(rdos::deleted_at.is_null())
            .select(rdos::org_id)
            .first::<i32>(conn)
            .optional(),
        AttachmentEntityType::Expense => expenses::table
            .filter(expenses::id.eq(target_id))
            .filter(expenses::deleted_at.is_null())
            .select(expenses::org_id)
            .first::<i32>(conn)
            .optional(),
        AttachmentEntityType::Checklist => checklists::table
            .filter(checklists::id.eq(target_id))
            .filter(checklists::deleted_at.is_null())
            .select(checklists::org_id)
            .first::<i32>(conn)
            .optional(),
        AttachmentEntityType::Equipamento => equipamentos::table
            .filter(equipamentos::id.eq(target_id))
            .filter(equipamentos::deleted_at.is_null())
            .select(equipamentos::org_id)
            .first::<i32>(conn)
            .optional(),
    }
}

pub fn insert_attachment(
    conn: &mut SqliteConnection,
    new_attachment: NewAttachment,
    acting_user_id: Option<i32>,
) -> Result<Attachment, diesel::result::Error> {
    use crate::schema::attachments::dsl::*;

    diesel::insert_into(attachments)
        .values(&new_attachment)
        .execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let attachment = attachments
        .filter(id.eq(last_id))
        .select(Attachment::as_select())
        .first(conn)?;

    stamp_user(conn, "attachments", attachment.id, "create", acting_user_id);
    Ok(attachment)
}

pub fn get_attachment(
    conn: &mut SqliteConnection,
    attachment_id: i32,
) -> Result<Option<Attachment>, diesel::result::Error> {
    use crate::schema::attachments::dsl::*;
    attachments
        .filter(id.eq(attachment_id))
        .filter(deleted_at.is_null())
        .select(Attachment::as_select())
        .first(conn)
        .optional()
}

pub fn get_attachment_with_timestamps(
    conn: &mut SqliteConnection,
    attachment_id: i32,
) -> Result<Option<Timestamped<Attachment>>, diesel::result::Error> {
    match get_attachment(conn, attachment_id)? {
        Some(attachment) => {
            with_timestamps(conn, "attachments", attachment_id, attachment).map(Some)
        }
        None => Ok(None),
    }
}

/// Lists live attachments ordered by id, optionally for one entity type
/// and/or one entity.
pub fn list_attachments(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    type_filter: Option<AttachmentEntityType>,
    entity_filter: Option<i32>,
    page: Page,
) -> Result<Vec<Attachment>, diesel::result::Error> {
    use crate::schema::attachments::dsl::*;

    let mut query = attachments.filter(deleted_at.is_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    if let Some(kind) = type_filter {
        query = query.filter(entity_type.eq(kind.as_str()));
    }
    if let Some(target) = entity_filter {
        query = query.filter(entity_id.eq(target));
    }

    query
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(Attachment::as_select())
        .load(conn)
}

/// Renames an attachment or repoints it at a new storage object.
pub fn update_attachment(
    conn: &mut SqliteConnection,
    attachment_id: i32,
    changes: AttachmentChanges,
    acting_user_id: Option<i32>,
) -> Result<Attachment, diesel::result::Error> {
    use crate::schema::attachments::dsl::*;

    let current = get_attachment(conn, attachment_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(attachments.filter(id.eq(attachment_id)))
        .set((
            file_name.eq(changes.file_name.unwrap_or(current.file_name)),
            storage_path.eq(changes.storage_path.unwrap_or(current.storage_path)),
        ))
        .execute(conn)?;

    let attachment = attachments
        .filter(id.eq(attachment_id))
        .select(Attachment::as_select())
        .first(conn)?;
    stamp_user(conn, "attachments", attachment_id, "update", acting_user_id);
    Ok(attachment)
}

pub fn soft_delete_attachment(
    conn: &mut SqliteConnection,
    attachment_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::attachments::dsl::*;

    let result = diesel::update(
        attachments
            .filter(id.eq(attachment_id))
            .filter(deleted_at.is_null()),
    )
    .set(deleted_at.eq(Some(Utc::now().naive_utc())))
    .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "attachments", attachment_id, "delete", acting_user_id);
    }
    Ok(result)
}
