//! Friendship requests and the relationship views derived from them.
//!
//! A relationship between two users is a single directed record: `user1` asked
//! `user2`. Nothing is stored for the reverse direction, so every question
//! about a pair goes through [`find_relation`], which probes both orientations
//! and reports which one matched.
//!
//! ```text
//! (none) --request--> Requested --accept (user2)--> Accepted --remove (either)--> (none)
//!                         |
//!                         +-------reject (user2)--> Rejected
//! ```
//!
//! `Rejected` is terminal: the record stays and blocks new requests for the pair.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::{
    error::AppError,
    model::{friendship::FriendRequestInfo, user::UserSummary},
    schema::FriendshipRow,
    store::{FriendshipStore, StoreError, UserStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Requested,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn code(self) -> i32 {
        match self {
            FriendshipStatus::Requested => 0,
            FriendshipStatus::Accepted => 1,
            FriendshipStatus::Rejected => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(FriendshipStatus::Requested),
            1 => Some(FriendshipStatus::Accepted),
            2 => Some(FriendshipStatus::Rejected),
            _ => None,
        }
    }
}

impl Serialize for FriendshipStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: i32,
    pub user1: i32,
    pub user2: i32,
    pub status: FriendshipStatus,
    pub create_date: NaiveDateTime,
}

impl Friendship {
    /// The party that is not `user`.
    pub fn other(&self, user: i32) -> i32 {
        if self.user1 == user {
            self.user2
        } else {
            self.user1
        }
    }
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = StoreError;

    fn try_from(row: FriendshipRow) -> Result<Self, Self::Error> {
        let status = FriendshipStatus::from_code(row.status).ok_or_else(|| {
            StoreError::InvalidRecord(format!(
                "friendship {} has unknown status {}",
                row.id, row.status
            ))
        })?;
        Ok(Friendship {
            id: row.id,
            user1: row.user1,
            user2: row.user2,
            status,
            create_date: row.create_date,
        })
    }
}

/// Which way round the stored record points, seen from the first user asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The first user is `user1`, the initiator.
    Outgoing,
    /// The first user is `user2`, the recipient.
    Incoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub record: Friendship,
    pub orientation: Orientation,
}

/// Status of a pair as reported to clients.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationStatus {
    #[serde(rename = "no friendship")]
    NoFriendship,
    #[serde(rename = "requested")]
    Requested,
    #[serde(rename = "requestee")]
    Requestee,
    #[serde(rename = "friends")]
    Friends,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "rejectee")]
    Rejectee,
}

impl Relation {
    pub fn status(&self) -> RelationStatus {
        match (self.orientation, self.record.status) {
            (_, FriendshipStatus::Accepted) => RelationStatus::Friends,
            (Orientation::Outgoing, FriendshipStatus::Requested) => RelationStatus::Requested,
            (Orientation::Outgoing, FriendshipStatus::Rejected) => RelationStatus::Rejected,
            (Orientation::Incoming, FriendshipStatus::Requested) => RelationStatus::Requestee,
            (Orientation::Incoming, FriendshipStatus::Rejected) => RelationStatus::Rejectee,
        }
    }
}

/// Probes `a -> b`, then `b -> a`.
pub fn find_relation(
    store: &dyn FriendshipStore,
    a: i32,
    b: i32,
) -> Result<Option<Relation>, StoreError> {
    if let Some(record) = store.find_directed(a, b)? {
        return Ok(Some(Relation {
            record,
            orientation: Orientation::Outgoing,
        }));
    }
    Ok(store.find_directed(b, a)?.map(|record| Relation {
        record,
        orientation: Orientation::Incoming,
    }))
}

pub fn create_request(
    friendships: &dyn FriendshipStore,
    users: &dyn UserStore,
    initiator: i32,
    recipient: i32,
) -> Result<Friendship, AppError> {
    if initiator == recipient {
        return Err(AppError::BadRequest(
            "Cannot add yourself as friend.".to_string(),
        ));
    }
    if users.find_role(recipient)?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    if find_relation(friendships, initiator, recipient)?.is_some() {
        return Err(AppError::conflict("Friendship already exists"));
    }
    Ok(friendships.insert(initiator, recipient, FriendshipStatus::Requested)?)
}

pub fn status(store: &dyn FriendshipStore, a: i32, b: i32) -> Result<RelationStatus, StoreError> {
    Ok(find_relation(store, a, b)?
        .map(|relation| relation.status())
        .unwrap_or(RelationStatus::NoFriendship))
}

pub fn are_friends(store: &dyn FriendshipStore, a: i32, b: i32) -> Result<bool, StoreError> {
    Ok(status(store, a, b)? == RelationStatus::Friends)
}

pub fn incoming_requests(
    friendships: &dyn FriendshipStore,
    users: &dyn UserStore,
    recipient: i32,
) -> Result<Vec<FriendRequestInfo>, StoreError> {
    let requests = friendships.incoming(recipient)?;
    let ids = requests.iter().map(|r| r.user1).collect::<Vec<_>>();
    let summaries = users.summaries(&ids)?;
    Ok(requests
        .into_iter()
        .filter_map(|r| {
            summaries.get(&r.user1).map(|user1| FriendRequestInfo {
                id: r.id,
                user1: user1.clone(),
                create_date: r.create_date,
            })
        })
        .collect())
}

pub fn count_incoming(store: &dyn FriendshipStore, recipient: i32) -> Result<i64, StoreError> {
    store.count_incoming(recipient)
}

pub fn friends(
    friendships: &dyn FriendshipStore,
    users: &dyn UserStore,
    user: i32,
) -> Result<Vec<UserSummary>, StoreError> {
    let others = friendships
        .accepted_for(user)?
        .iter()
        .map(|record| record.other(user))
        .collect::<Vec<_>>();
    let mut summaries = users.summaries(&others)?;
    Ok(others
        .iter()
        .filter_map(|id| summaries.remove(id))
        .collect())
}

pub fn accept(
    store: &dyn FriendshipStore,
    recipient: i32,
    request_id: i32,
) -> Result<Friendship, AppError> {
    answer(store, recipient, request_id, FriendshipStatus::Accepted)
}

pub fn reject(
    store: &dyn FriendshipStore,
    recipient: i32,
    request_id: i32,
) -> Result<Friendship, AppError> {
    answer(store, recipient, request_id, FriendshipStatus::Rejected)
}

fn answer(
    store: &dyn FriendshipStore,
    recipient: i32,
    request_id: i32,
    to: FriendshipStatus,
) -> Result<Friendship, AppError> {
    store
        .transition(request_id, recipient, FriendshipStatus::Requested, to)?
        .ok_or_else(|| AppError::not_found("No friendship request found"))
}

/// Deletes an accepted friendship in either orientation. Returns whether one existed.
pub fn remove(store: &dyn FriendshipStore, user: i32, other: i32) -> Result<bool, StoreError> {
    match find_relation(store, user, other)? {
        Some(relation) if relation.record.status == FriendshipStatus::Accepted => {
            store.delete(relation.record.id)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::Role, store::memory::MemoryStore};

    const ALICE: i32 = 1;
    const BOB: i32 = 2;
    const CAROL: i32 = 3;

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store.add_user(ALICE, "alice", Role::Regular);
        store.add_user(BOB, "bob", Role::Regular);
        store.add_user(CAROL, "carol", Role::Regular);
        store
    }

    #[test]
    fn strangers_have_no_friendship() {
        let store = store();
        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::NoFriendship);
        assert!(!are_friends(&store, ALICE, BOB).unwrap());
    }

    #[test]
    fn request_is_seen_from_both_sides() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();
        assert_eq!(request.status, FriendshipStatus::Requested);
        assert_eq!((request.user1, request.user2), (ALICE, BOB));

        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::Requested);
        assert_eq!(status(&store, BOB, ALICE).unwrap(), RelationStatus::Requestee);
        assert!(!are_friends(&store, ALICE, BOB).unwrap());
    }

    #[test]
    fn relation_reports_matched_orientation() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();

        let relation = find_relation(&store, BOB, ALICE).unwrap().unwrap();
        assert_eq!(relation.orientation, Orientation::Incoming);
        assert_eq!(relation.record, request);
        let relation = find_relation(&store, ALICE, BOB).unwrap().unwrap();
        assert_eq!(relation.orientation, Orientation::Outgoing);
    }

    #[test]
    fn accepted_request_makes_friends_both_ways() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();
        let accepted = accept(&store, BOB, request.id).unwrap();
        assert_eq!(accepted.status, FriendshipStatus::Accepted);

        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::Friends);
        assert_eq!(status(&store, BOB, ALICE).unwrap(), RelationStatus::Friends);
        assert!(are_friends(&store, ALICE, BOB).unwrap());
        assert!(are_friends(&store, BOB, ALICE).unwrap());
    }

    #[test]
    fn rejected_request_is_labelled_per_side() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();
        reject(&store, BOB, request.id).unwrap();

        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::Rejected);
        assert_eq!(status(&store, BOB, ALICE).unwrap(), RelationStatus::Rejectee);
        assert!(!are_friends(&store, ALICE, BOB).unwrap());
    }

    #[test]
    fn rejected_is_terminal() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();
        reject(&store, BOB, request.id).unwrap();

        assert!(matches!(
            accept(&store, BOB, request.id),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            create_request(&store, &store, ALICE, BOB),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            create_request(&store, &store, BOB, ALICE),
            Err(AppError::Conflict(_))
        ));
        assert!(!remove(&store, ALICE, BOB).unwrap());
        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::Rejected);
    }

    #[test]
    fn only_recipient_can_answer() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();

        match accept(&store, ALICE, request.id) {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "No friendship request found"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(reject(&store, CAROL, request.id).is_err());
        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::Requested);
    }

    #[test]
    fn unknown_request_id_is_not_found() {
        let store = store();
        assert!(matches!(accept(&store, BOB, 999), Err(AppError::NotFound(_))));
    }

    #[test]
    fn duplicate_requests_are_refused_in_either_orientation() {
        let store = store();
        create_request(&store, &store, ALICE, BOB).unwrap();
        assert!(matches!(
            create_request(&store, &store, ALICE, BOB),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            create_request(&store, &store, BOB, ALICE),
            Err(AppError::Conflict(_))
        ));
        assert_eq!(count_incoming(&store, BOB).unwrap(), 1);
    }

    #[test]
    fn self_and_unknown_requests_are_refused() {
        let store = store();
        assert!(matches!(
            create_request(&store, &store, ALICE, ALICE),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            create_request(&store, &store, ALICE, 77),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn incoming_requests_carry_initiator_summary() {
        let store = store();
        let from_alice = create_request(&store, &store, ALICE, BOB).unwrap();
        let from_carol = create_request(&store, &store, CAROL, BOB).unwrap();
        create_request(&store, &store, BOB, ALICE).unwrap_err();

        let requests = incoming_requests(&store, &store, BOB).unwrap();
        let ids = requests.iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![from_carol.id, from_alice.id]);
        assert_eq!(requests[0].user1.username, "carol");
        assert_eq!(requests[1].user1.username, "alice");
        assert_eq!(count_incoming(&store, BOB).unwrap(), 2);
        assert_eq!(count_incoming(&store, ALICE).unwrap(), 0);

        accept(&store, BOB, from_alice.id).unwrap();
        assert_eq!(count_incoming(&store, BOB).unwrap(), 1);
    }

    #[test]
    fn friends_lists_the_other_party_in_both_orientations() {
        let store = store();
        let ab = create_request(&store, &store, ALICE, BOB).unwrap();
        let ca = create_request(&store, &store, CAROL, ALICE).unwrap();
        accept(&store, BOB, ab.id).unwrap();
        accept(&store, ALICE, ca.id).unwrap();

        let names = |user| {
            friends(&store, &store, user)
                .unwrap()
                .into_iter()
                .map(|s| s.username)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(ALICE), vec!["bob", "carol"]);
        assert_eq!(names(BOB), vec!["alice"]);
        assert_eq!(names(CAROL), vec!["alice"]);
    }

    #[test]
    fn pending_requests_are_not_friends() {
        let store = store();
        create_request(&store, &store, ALICE, BOB).unwrap();
        assert!(friends(&store, &store, ALICE).unwrap().is_empty());
        assert!(friends(&store, &store, BOB).unwrap().is_empty());
    }

    #[test]
    fn removing_a_friendship_deletes_the_record() {
        let store = store();
        let request = create_request(&store, &store, ALICE, BOB).unwrap();
        accept(&store, BOB, request.id).unwrap();

        assert!(remove(&store, BOB, ALICE).unwrap());
        assert!(friends(&store, &store, ALICE).unwrap().is_empty());
        assert!(friends(&store, &store, BOB).unwrap().is_empty());
        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::NoFriendship);
        assert!(!remove(&store, ALICE, BOB).unwrap());

        let again = create_request(&store, &store, BOB, ALICE).unwrap();
        assert_eq!(again.status, FriendshipStatus::Requested);
    }

    #[test]
    fn pending_request_cannot_be_removed() {
        let store = store();
        create_request(&store, &store, ALICE, BOB).unwrap();
        assert!(!remove(&store, ALICE, BOB).unwrap());
        assert_eq!(status(&store, ALICE, BOB).unwrap(), RelationStatus::Requested);
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            FriendshipStatus::Requested,
            FriendshipStatus::Accepted,
            FriendshipStatus::Rejected,
        ] {
            assert_eq!(FriendshipStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(FriendshipStatus::from_code(3), None);
        assert_eq!(
            serde_json::to_value(RelationStatus::NoFriendship).unwrap(),
            "no friendship"
        );
        assert_eq!(serde_json::to_value(FriendshipStatus::Accepted).unwrap(), 1);
    }
}
