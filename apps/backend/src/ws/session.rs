//! Per-connection WebSocket actor.
//!
//! Clients subscribe by connecting to `/games/ws/{session_id}` and then only
//! receive: every event addressed to that session is relayed as one JSON
//! text frame. No client-to-server messages are required (keepalive only).

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::app_state::AppState;
use crate::ws::hub::{SessionBroadcast, SessionRegistry};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();
    let session = WsSession::new(session_id, app_state.ws_registry());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    session_id: String,
    registry: Arc<SessionRegistry>,
    token: Option<Uuid>,
    last_heartbeat: Instant,
}

impl WsSession {
    fn new(session_id: String, registry: Arc<SessionRegistry>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            session_id,
            registry,
            token: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    session_id = %actor.session_id,
                    "heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let recipient = ctx.address().recipient::<SessionBroadcast>();
        self.token = Some(self.registry.register(&self.session_id, recipient));

        info!(
            conn_id = %self.conn_id,
            session_id = %self.session_id,
            "websocket connected"
        );

        // Connection acknowledgment before any relayed event.
        ctx.text(format!(
            "{{\"type\":\"connected\",\"session_id\":\"{}\"}}",
            self.session_id
        ));

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(token) = self.token.take() {
            self.registry.unregister(&self.session_id, token);
        }
        info!(
            conn_id = %self.conn_id,
            session_id = %self.session_id,
            "websocket disconnected"
        );
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            // The protocol is server-push only; inbound frames count as
            // keepalive and are otherwise ignored.
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    session_id = %self.session_id,
                    error = %err,
                    "websocket protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<SessionBroadcast> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: SessionBroadcast, ctx: &mut Self::Context) {
        ctx.text(msg.payload.as_str());
    }
}
