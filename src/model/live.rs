use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum LiveEventKind {
    Message,
    Notification,
    FriendRequest,
}

#[derive(actix::Message, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[rtype(result = "()")]
pub struct LiveEvent {
    pub kind: LiveEventKind,
    pub payload: serde_json::Value,
}

#[derive(actix::Message)]
#[rtype(result = "usize")]
pub struct Connect {
    pub user_id: i32,
    pub addr: actix::Recipient<LiveEvent>,
}

#[derive(actix::Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub user_id: i32,
    pub session_id: usize,
}

#[derive(actix::Message)]
#[rtype(result = "()")]
pub struct Publish {
    pub user_id: i32,
    pub event: LiveEvent,
}
