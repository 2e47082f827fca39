use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use qgig_core::channels::{ChannelKey, EVENT_CONNECTED, EVENT_NOTIFICATION_READ};
use qgig_core::error::CoreError;
use qgig_core::roles::RoleName;
use qgig_core::types::DbId;
use qgig_events::{ChannelTransport, Outbound, RealtimeEvent, TransportError};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::auth::roles::RoleResolver;
use crate::engine::uow::UnitOfWork;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authenticate, credential_from_headers, AuthContext, Credential};
use crate::notifications::dispatcher;
use crate::state::AppState;
use crate::ws::protocol::{ClientMessage, EVENT_ERROR};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Access token, for clients that cannot set headers on the upgrade.
    pub token: Option<String>,
}

/// Who a connection belongs to and which channels it joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPlan {
    pub user_id: DbId,
    pub role: Option<RoleName>,
    /// Personal channel first, then the role channel when there is one.
    pub channels: Vec<ChannelKey>,
}

impl ConnectionPlan {
    /// The channel named in the `connected` frame.
    fn room(&self) -> ChannelKey {
        self.channels
            .last()
            .copied()
            .unwrap_or(ChannelKey::User(self.user_id))
    }
}

fn transport_error(e: TransportError) -> AppError {
    AppError::InternalError(format!("Channel error: {e}"))
}

/// GET /api/v1/ws
///
/// Authenticates with `?token=`, the `Authorization` header or the session
/// cookie before upgrading; an unauthenticated request never becomes a
/// socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let credential = query
        .token
        .filter(|t| !t.is_empty())
        .map(Credential::Bearer)
        .or_else(|| credential_from_headers(&headers))
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing token".into())))?;

    let ctx = authenticate(&state, credential).await?;
    let plan = plan_connection(&state, &ctx).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, plan)))
}

/// Work out the channels for an authenticated caller.
///
/// The role channel follows the active role at connect time and is keyed by
/// the matching profile id. Admins, users without that profile and tokens
/// claiming a role the user no longer holds only get their personal channel.
pub async fn plan_connection(state: &AppState, ctx: &AuthContext) -> AppResult<ConnectionPlan> {
    let role = RoleResolver::active_role(ctx).ok();
    let mut channels = vec![ChannelKey::User(ctx.user_id)];

    let mut uow = UnitOfWork::begin(state).await?;
    let held = match role {
        Some(r @ (RoleName::Institution | RoleName::Professional)) => {
            match state.resolver.authorize(uow.tx.as_mut(), ctx, &[r]).await {
                Ok(_) => Some(r),
                Err(AppError::Core(CoreError::Forbidden(reason))) => {
                    tracing::warn!(
                        user_id = ctx.user_id,
                        role = %r,
                        %reason,
                        "Role channel refused",
                    );
                    None
                }
                Err(e) => return Err(e),
            }
        }
        _ => None,
    };
    let profile_id = match held {
        Some(RoleName::Institution) => uow
            .tx
            .find_institution_by_user(ctx.user_id)
            .await?
            .map(|i| i.id),
        Some(RoleName::Professional) => uow
            .tx
            .find_professional_by_user(ctx.user_id)
            .await?
            .map(|p| p.id),
        Some(RoleName::Admin) | None => None,
    };
    drop(uow);

    if let Some(channel) = held.zip(profile_id).and_then(|(r, id)| ChannelKey::for_role(r, id)) {
        channels.push(channel);
    }

    Ok(ConnectionPlan {
        user_id: ctx.user_id,
        role,
        channels,
    })
}

/// Register `conn_id`, join its channels and queue the `connected` frame.
///
/// Returns the receiver the socket task drains.
pub async fn open_connection(
    state: &AppState,
    conn_id: &str,
    plan: &ConnectionPlan,
) -> AppResult<mpsc::UnboundedReceiver<Outbound>> {
    let rx = state.registry.register(conn_id.to_string(), plan.user_id).await;
    for channel in &plan.channels {
        state
            .registry
            .join(conn_id, *channel)
            .await
            .map_err(transport_error)?;
    }

    let room = plan.room();
    let connected = RealtimeEvent::new(
        room,
        EVENT_CONNECTED,
        json!({
            "user_id": plan.user_id,
            "role": plan.role,
            "room": room.to_string(),
        }),
    );
    let frame = connected
        .to_frame()
        .map_err(|e| AppError::InternalError(format!("Frame encoding error: {e}")))?;
    state
        .registry
        .send_to(conn_id, Outbound::Text(frame.into()))
        .await
        .map_err(transport_error)?;

    Ok(rx)
}

/// Act on one inbound text frame from `user_id`.
pub async fn handle_inbound(state: &AppState, user_id: DbId, text: &str) -> AppResult<()> {
    let message = ClientMessage::parse(text)
        .map_err(|e| CoreError::Validation(format!("Unrecognised message: {e}")))?;

    match message {
        ClientMessage::MarkNotificationRead { notification_id } => {
            let mut uow = UnitOfWork::begin(state).await?;
            let notification = dispatcher::mark_read(&mut uow, user_id, notification_id).await?;
            let unread_count = dispatcher::unread_count(&mut uow, user_id).await?;
            uow.outbox.push(
                ChannelKey::User(user_id),
                EVENT_NOTIFICATION_READ,
                json!({
                    "notification_id": notification.id,
                    "unread_count": unread_count,
                }),
            );
            uow.commit(state.transport()).await?;
        }
    }
    Ok(())
}

/// Manage one connection after the upgrade.
///
/// A spawned sender task drains the registry queue into the socket sink;
/// the current task reads inbound frames. The connection is removed from
/// the registry on the way out.
async fn handle_socket(socket: WebSocket, state: AppState, plan: ConnectionPlan) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let mut rx = match open_connection(&state, &conn_id, &plan).await {
        Ok(rx) => rx,
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Failed to open real-time connection");
            state.registry.remove(&conn_id).await;
            return;
        }
    };
    tracing::info!(
        conn_id = %conn_id,
        user_id = plan.user_id,
        channels = plan.channels.len(),
        "WebSocket connected",
    );

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let msg = match frame {
                Outbound::Text(text) => Message::Text(text.as_ref().into()),
                Outbound::Ping => Message::Ping(Default::default()),
                Outbound::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    let registry = Arc::clone(&state.registry);
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_inbound(&state, plan.user_id, text.as_str()).await {
                    tracing::debug!(conn_id = %conn_id, error = %e, "Inbound message failed");
                    let reply = RealtimeEvent::new(
                        ChannelKey::User(plan.user_id),
                        EVENT_ERROR,
                        json!({ "message": e.classify().2 }),
                    );
                    if let Ok(frame) = reply.to_frame() {
                        let _ = registry.send_to(&conn_id, Outbound::Text(frame.into())).await;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    registry.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
