use std::collections::HashMap;

use actix::{
    fut, Actor, ActorContext, ActorFutureExt, Addr, AsyncContext, Context, ContextFutureSpawner,
    Handler, Recipient, Running, StreamHandler, WrapFuture,
};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    auth::AuthUser,
    model::live::{Connect, Disconnect, LiveEvent, LiveEventKind, Publish},
};

/// Fans events out to connected websocket sessions. Delivery is best effort:
/// users without an open session simply miss the event.
#[derive(Default)]
pub struct LiveServer {
    sessions: HashMap<i32, (usize, Recipient<LiveEvent>)>,
    next_session: usize,
}

impl LiveServer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Actor for LiveServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for LiveServer {
    type Result = usize;

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        self.next_session += 1;
        self.sessions
            .insert(msg.user_id, (self.next_session, msg.addr));
        debug!(user_id = msg.user_id, "live session connected");
        self.next_session
    }
}

impl Handler<Disconnect> for LiveServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) -> Self::Result {
        // A newer session for the same user replaces the old one; keep it.
        if let Some((session_id, _)) = self.sessions.get(&msg.user_id) {
            if *session_id == msg.session_id {
                self.sessions.remove(&msg.user_id);
            }
        }
    }
}

impl Handler<Publish> for LiveServer {
    type Result = ();

    fn handle(&mut self, msg: Publish, _ctx: &mut Self::Context) -> Self::Result {
        if let Some((_, session)) = self.sessions.get(&msg.user_id) {
            session.do_send(msg.event);
        }
    }
}

/// Queues `payload` for `user_id` if they are connected.
pub fn publish<T: Serialize>(
    server: &Addr<LiveServer>,
    user_id: i32,
    kind: LiveEventKind,
    payload: &T,
) {
    match serde_json::to_value(payload) {
        Ok(payload) => server.do_send(Publish {
            user_id,
            event: LiveEvent { kind, payload },
        }),
        Err(e) => warn!(error = %e, "failed to encode live event"),
    }
}

struct LiveSession {
    user_id: i32,
    session_id: usize,
    server: Addr<LiveServer>,
}

impl Actor for LiveSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        self.server
            .send(Connect {
                user_id: self.user_id,
                addr: addr.recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(session_id) => act.session_id = session_id,
                    _ => ctx.stop(),
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.server.do_send(Disconnect {
            user_id: self.user_id,
            session_id: self.session_id,
        });
        Running::Stop
    }
}

impl Handler<LiveEvent> for LiveSession {
    type Result = ();

    fn handle(&mut self, msg: LiveEvent, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!(error = %e, "failed to encode live event"),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for LiveSession {
    fn handle(&mut self, item: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match item {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(_) => ctx.stop(),
            _ => (),
        }
    }
}

pub async fn stream(
    req: HttpRequest,
    user: AuthUser,
    payload: web::Payload,
    server: web::Data<Addr<LiveServer>>,
) -> Result<HttpResponse, Error> {
    ws::start(
        LiveSession {
            user_id: user.id,
            session_id: 0,
            server: server.get_ref().clone(),
        },
        &req,
        payload,
    )
}
