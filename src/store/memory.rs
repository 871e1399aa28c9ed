use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;

use super::{FriendshipStore, StoreError, UserStore};
use crate::{
    auth::Role,
    friendship::{Friendship, FriendshipStatus},
    model::user::UserSummary,
};

#[derive(Default)]
struct Inner {
    users: HashMap<i32, (String, Role)>,
    friendships: Vec<Friendship>,
    next_id: i32,
}

/// Store kept in process memory, for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn add_user(&self, id: i32, username: &str, role: Role) {
        self.lock().users.insert(id, (username.to_string(), role));
    }

    pub fn friendship(&self, id: i32) -> Option<Friendship> {
        self.lock().friendships.iter().find(|f| f.id == id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl UserStore for MemoryStore {
    fn find_role(&self, user_id: i32) -> Result<Option<Role>, StoreError> {
        Ok(self.lock().users.get(&user_id).map(|(_, role)| *role))
    }

    fn summaries(&self, user_ids: &[i32]) -> Result<HashMap<i32, UserSummary>, StoreError> {
        let inner = self.lock();
        Ok(user_ids
            .iter()
            .filter_map(|id| {
                inner.users.get(id).map(|(username, _)| {
                    (
                        *id,
                        UserSummary {
                            id: *id,
                            username: username.clone(),
                            avatar: None,
                        },
                    )
                })
            })
            .collect())
    }
}

impl FriendshipStore for MemoryStore {
    fn insert(
        &self,
        initiator: i32,
        recipient: i32,
        status: FriendshipStatus,
    ) -> Result<Friendship, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let record = Friendship {
            id: inner.next_id,
            user1: initiator,
            user2: recipient,
            status,
            create_date: Utc::now().naive_utc(),
        };
        inner.friendships.push(record.clone());
        Ok(record)
    }

    fn find_directed(&self, user1: i32, user2: i32) -> Result<Option<Friendship>, StoreError> {
        Ok(self
            .lock()
            .friendships
            .iter()
            .find(|f| f.user1 == user1 && f.user2 == user2)
            .cloned())
    }

    fn transition(
        &self,
        id: i32,
        recipient: i32,
        from: FriendshipStatus,
        to: FriendshipStatus,
    ) -> Result<Option<Friendship>, StoreError> {
        let mut inner = self.lock();
        Ok(inner
            .friendships
            .iter_mut()
            .find(|f| f.id == id && f.user2 == recipient && f.status == from)
            .map(|f| {
                f.status = to;
                f.clone()
            }))
    }

    fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.friendships.len();
        inner.friendships.retain(|f| f.id != id);
        Ok(inner.friendships.len() != before)
    }

    fn incoming(&self, recipient: i32) -> Result<Vec<Friendship>, StoreError> {
        let mut list = self
            .lock()
            .friendships
            .iter()
            .filter(|f| f.user2 == recipient && f.status == FriendshipStatus::Requested)
            .cloned()
            .collect::<Vec<_>>();
        list.sort_by(|a, b| (b.create_date, b.id).cmp(&(a.create_date, a.id)));
        Ok(list)
    }

    fn count_incoming(&self, recipient: i32) -> Result<i64, StoreError> {
        Ok(self.incoming(recipient)?.len() as i64)
    }

    fn accepted_for(&self, user: i32) -> Result<Vec<Friendship>, StoreError> {
        let mut list = self
            .lock()
            .friendships
            .iter()
            .filter(|f| {
                f.status == FriendshipStatus::Accepted && (f.user1 == user || f.user2 == user)
            })
            .cloned()
            .collect::<Vec<_>>();
        list.sort_by(|a, b| (a.create_date, a.id).cmp(&(b.create_date, b.id)));
        Ok(list)
    }
}
