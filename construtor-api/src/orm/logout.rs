//! Session revocation.

use diesel::prelude::*;

use crate::orm::login::DbRunner;
use crate::schema::sessions::dsl::*;

/// Marks a session revoked. The row is kept for auditing; returns the number
/// of sessions changed (0 for unknown tokens).
pub async fn revoke_session<D: DbRunner>(
    db: &D,
    session_id: &str,
) -> Result<usize, diesel::result::Error> {
    let session_id = session_id.to_string();
    db.run(move |conn| {
        diesel::update(sessions.filter(id.eq(&session_id)))
            .set(revoked.eq(true))
            .execute(conn)
    })
    .await
}

/// Revokes every open session of a user, e.g. after a password change.
pub fn revoke_user_sessions(
    conn: &mut SqliteConnection,
    target_user_id: i32,
) -> Result<usize, diesel::result::Error> {
    diesel::update(sessions.filter(user_id.eq(target_user_id)).filter(revoked.eq(false)))
        .set(revoked.eq(true))
        .execute(conn)
}
