//! Durable notifications plus best-effort push.
//!
//! [`notify`] writes the row inside the caller's transaction and queues a
//! `notification` event on the recipient's `user_{id}` channel. The queued
//! push is released only after the transaction commits, so a client reacting
//! to it always finds the row. Offline recipients see it on their next
//! listing.

use qgig_core::channels::{ChannelKey, EVENT_NOTIFICATION};
use qgig_core::error::{AccessDenied, CoreError};
use qgig_core::notifications::NotificationText;
use qgig_core::types::DbId;
use qgig_db::models::notification::{CreateNotification, Notification};
use serde_json::json;

use crate::engine::uow::UnitOfWork;
use crate::error::AppResult;

/// Persist a notification for `recipient_user_id` and queue its push.
pub async fn notify(
    uow: &mut UnitOfWork,
    recipient_user_id: DbId,
    text: NotificationText,
    interest_id: Option<DbId>,
) -> AppResult<Notification> {
    let notification = uow
        .tx
        .create_notification(&CreateNotification {
            user_id: recipient_user_id,
            title: text.title,
            message: text.message,
            interest_id,
        })
        .await?;

    uow.outbox.push(
        ChannelKey::User(recipient_user_id),
        EVENT_NOTIFICATION,
        json!({
            "id": notification.id,
            "title": notification.title,
            "message": notification.message,
            "interest_id": notification.interest_id,
            "is_read": notification.is_read,
            "created_at": notification.created_at,
        }),
    );

    tracing::debug!(
        notification_id = notification.id,
        user_id = recipient_user_id,
        "Notification created",
    );
    Ok(notification)
}

/// Fetch a notification owned by `user_id`.
pub async fn find_owned(
    uow: &mut UnitOfWork,
    user_id: DbId,
    notification_id: DbId,
) -> AppResult<Notification> {
    let notification = uow
        .tx
        .find_notification(notification_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        })?;
    if notification.user_id != user_id {
        return Err(AccessDenied::NotOwner("Notification").into());
    }
    Ok(notification)
}

pub async fn list(
    uow: &mut UnitOfWork,
    user_id: DbId,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Notification>> {
    Ok(uow
        .tx
        .list_notifications(user_id, unread_only, limit, offset)
        .await?)
}

pub async fn unread_count(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<i64> {
    Ok(uow.tx.count_unread_notifications(user_id).await?)
}

/// Mark one of the caller's notifications read. Already-read is fine.
pub async fn mark_read(
    uow: &mut UnitOfWork,
    user_id: DbId,
    notification_id: DbId,
) -> AppResult<Notification> {
    let mut notification = find_owned(uow, user_id, notification_id).await?;
    if !notification.is_read {
        uow.tx.mark_notification_read(notification_id).await?;
        notification.is_read = true;
        notification.read_at = Some(chrono::Utc::now());
    }
    Ok(notification)
}

pub async fn mark_all_read(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<u64> {
    Ok(uow.tx.mark_all_notifications_read(user_id).await?)
}

pub async fn delete(uow: &mut UnitOfWork, user_id: DbId, notification_id: DbId) -> AppResult<()> {
    find_owned(uow, user_id, notification_id).await?;
    uow.tx.delete_notification(notification_id).await?;
    Ok(())
}

/// Delete every notification of the caller.
pub async fn delete_all(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<u64> {
    Ok(uow.tx.delete_notifications_for_user(user_id, None).await?)
}

/// Delete the caller's notifications among `ids`; ids owned by someone else
/// are skipped.
pub async fn delete_selected(
    uow: &mut UnitOfWork,
    user_id: DbId,
    ids: &[DbId],
) -> AppResult<u64> {
    if ids.is_empty() {
        return Err(CoreError::Validation("notification_ids must not be empty".into()).into());
    }
    Ok(uow
        .tx
        .delete_notifications_for_user(user_id, Some(ids))
        .await?)
}
