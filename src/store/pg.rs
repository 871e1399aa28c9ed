use std::collections::HashMap;

use diesel::prelude::*;

use super::{FriendshipStore, StoreError, UserStore};
use crate::{
    auth::Role,
    friendship::{Friendship, FriendshipStatus},
    model::user::{AvatarInfo, UserSummary},
    schema::{self, FriendshipRow},
    DbPool,
};

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Resolves user ids to their public summary, avatar included.
pub fn load_summaries(
    conn: &mut PgConnection,
    user_ids: &[i32],
) -> QueryResult<HashMap<i32, UserSummary>> {
    use schema::{images, users};

    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = users::table
        .left_join(images::table.on(users::avatar.eq(images::id.nullable())))
        .filter(users::id.eq_any(user_ids.to_vec()))
        .select((
            users::id,
            users::username,
            (images::id, images::url_full, images::url_175, images::url_80).nullable(),
        ))
        .load::<(
            i32,
            String,
            Option<(i32, String, Option<String>, Option<String>)>,
        )>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(id, username, avatar)| {
            (
                id,
                UserSummary {
                    id,
                    username,
                    avatar: avatar.map(|(id, url_full, url_175, url_80)| AvatarInfo {
                        id,
                        url_full,
                        url_175,
                        url_80,
                    }),
                },
            )
        })
        .collect())
}

/// Looks up the display urls of the given images, keyed by image id.
pub fn load_avatars(
    conn: &mut PgConnection,
    image_ids: &[i32],
) -> QueryResult<HashMap<i32, AvatarInfo>> {
    use schema::images::dsl::*;

    if image_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = images
        .filter(id.eq_any(image_ids.to_vec()))
        .select((id, url_full, url_175, url_80))
        .load::<(i32, String, Option<String>, Option<String>)>(conn)?;
    Ok(rows
        .into_iter()
        .map(|(image_id, full, small, tiny)| {
            (
                image_id,
                AvatarInfo {
                    id: image_id,
                    url_full: full,
                    url_175: small,
                    url_80: tiny,
                },
            )
        })
        .collect())
}

pub fn load_avatar(conn: &mut PgConnection, image_id: Option<i32>) -> QueryResult<Option<AvatarInfo>> {
    match image_id {
        None => Ok(None),
        Some(image_id) => Ok(load_avatars(conn, &[image_id])?.remove(&image_id)),
    }
}

fn into_records(rows: Vec<FriendshipRow>) -> Result<Vec<Friendship>, StoreError> {
    rows.into_iter().map(Friendship::try_from).collect()
}

impl UserStore for PgStore {
    fn find_role(&self, user_id: i32) -> Result<Option<Role>, StoreError> {
        use schema::users::dsl::*;

        let mut conn = self.pool.get()?;
        let found = users
            .find(user_id)
            .select(role)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(found.map(|r| Role::parse(&r)))
    }

    fn summaries(&self, user_ids: &[i32]) -> Result<HashMap<i32, UserSummary>, StoreError> {
        let mut conn = self.pool.get()?;
        Ok(load_summaries(&mut conn, user_ids)?)
    }
}

impl FriendshipStore for PgStore {
    fn insert(
        &self,
        initiator: i32,
        recipient: i32,
        new_status: FriendshipStatus,
    ) -> Result<Friendship, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        diesel::insert_into(friendships)
            .values((
                user1.eq(initiator),
                user2.eq(recipient),
                status.eq(new_status.code()),
            ))
            .get_result::<FriendshipRow>(&mut conn)?
            .try_into()
    }

    fn find_directed(&self, from: i32, to: i32) -> Result<Option<Friendship>, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        friendships
            .filter(user1.eq(from).and(user2.eq(to)))
            .order(id.asc())
            .first::<FriendshipRow>(&mut conn)
            .optional()?
            .map(Friendship::try_from)
            .transpose()
    }

    fn transition(
        &self,
        request_id: i32,
        recipient: i32,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Option<Friendship>, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        diesel::update(
            friendships.filter(
                id.eq(request_id)
                    .and(user2.eq(recipient))
                    .and(status.eq(from.code())),
            ),
        )
        .set(status.eq(to.code()))
        .get_result::<FriendshipRow>(&mut conn)
        .optional()?
        .map(Friendship::try_from)
        .transpose()
    }

    fn delete(&self, request_id: i32) -> Result<bool, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(friendships.find(request_id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn incoming(&self, recipient: i32) -> Result<Vec<Friendship>, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        let rows = friendships
            .filter(
                user2
                    .eq(recipient)
                    .and(status.eq(FriendshipStatus::Requested.code())),
            )
            .order((create_date.desc(), id.desc()))
            .load::<FriendshipRow>(&mut conn)?;
        into_records(rows)
    }

    fn count_incoming(&self, recipient: i32) -> Result<i64, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        Ok(friendships
            .filter(
                user2
                    .eq(recipient)
                    .and(status.eq(FriendshipStatus::Requested.code())),
            )
            .count()
            .get_result::<i64>(&mut conn)?)
    }

    fn accepted_for(&self, user: i32) -> Result<Vec<Friendship>, StoreError> {
        use schema::friendships::dsl::*;

        let mut conn = self.pool.get()?;
        let rows = friendships
            .filter(status.eq(FriendshipStatus::Accepted.code()))
            .filter(user1.eq(user).or(user2.eq(user)))
            .order((create_date.asc(), id.asc()))
            .load::<FriendshipRow>(&mut conn)?;
        into_records(rows)
    }
}
