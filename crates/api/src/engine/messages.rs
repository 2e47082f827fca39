//! Direct messages between users.

use qgig_core::channels::{ChannelKey, EVENT_NEW_MESSAGE};
use qgig_core::error::{AccessDenied, CoreError};
use qgig_core::messages::{validate_content, validate_subject};
use qgig_core::notifications;
use qgig_core::types::DbId;
use qgig_db::models::message::{CreateMessage, Message};
use serde::Deserialize;
use serde_json::json;

use super::uow::UnitOfWork;
use crate::error::AppResult;
use crate::notifications::dispatcher::notify;

/// Request body for `POST /messages`.
#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub receiver_id: DbId,
    pub content: String,
    pub subject: Option<String>,
    pub job_id: Option<DbId>,
}

async fn find_message(uow: &mut UnitOfWork, message_id: DbId) -> AppResult<Message> {
    uow.tx.find_message(message_id).await?.ok_or_else(|| {
        CoreError::NotFound {
            entity: "Message",
            id: message_id,
        }
        .into()
    })
}

/// Persist a message; the receiver gets a notification and a `new_message`
/// push after commit.
pub async fn send(uow: &mut UnitOfWork, sender_id: DbId, input: &SendMessage) -> AppResult<Message> {
    validate_content(&input.content).map_err(CoreError::Validation)?;
    validate_subject(input.subject.as_deref()).map_err(CoreError::Validation)?;
    if input.receiver_id == sender_id {
        return Err(CoreError::Validation("Cannot send a message to yourself".into()).into());
    }

    let sender = uow.tx.find_user(sender_id).await?.ok_or(CoreError::NotFound {
        entity: "User",
        id: sender_id,
    })?;
    if uow.tx.find_user(input.receiver_id).await?.is_none() {
        return Err(CoreError::NotFound {
            entity: "User",
            id: input.receiver_id,
        }
        .into());
    }
    if let Some(job_id) = input.job_id {
        if uow.tx.find_job(job_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "Job",
                id: job_id,
            }
            .into());
        }
    }

    let message = uow
        .tx
        .create_message(&CreateMessage {
            sender_id,
            receiver_id: input.receiver_id,
            job_id: input.job_id,
            subject: input.subject.clone(),
            content: input.content.trim().to_string(),
        })
        .await?;

    notify(
        uow,
        input.receiver_id,
        notifications::new_message(&sender.username),
        None,
    )
    .await?;
    uow.outbox.push(
        ChannelKey::User(input.receiver_id),
        EVENT_NEW_MESSAGE,
        json!(message),
    );

    tracing::debug!(message_id = message.id, sender_id, "Message sent");
    Ok(message)
}

pub async fn conversation(
    uow: &mut UnitOfWork,
    user_id: DbId,
    other_user_id: DbId,
) -> AppResult<Vec<Message>> {
    Ok(uow.tx.list_conversation(user_id, other_user_id).await?)
}

/// Only the receiver can mark a message read.
pub async fn mark_read(uow: &mut UnitOfWork, user_id: DbId, message_id: DbId) -> AppResult<()> {
    let message = find_message(uow, message_id).await?;
    if message.receiver_id != user_id {
        return Err(AccessDenied::NotOwner("Message").into());
    }
    uow.tx.mark_message_read(message_id).await?;
    Ok(())
}

pub async fn unread_count(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<i64> {
    Ok(uow.tx.count_unread_messages(user_id).await?)
}

/// Hide a message from the caller's side of the conversation.
pub async fn delete(uow: &mut UnitOfWork, user_id: DbId, message_id: DbId) -> AppResult<()> {
    let message = find_message(uow, message_id).await?;
    let for_sender = if message.sender_id == user_id {
        true
    } else if message.receiver_id == user_id {
        false
    } else {
        return Err(AccessDenied::NotOwner("Message").into());
    };
    uow.tx.hide_message(message_id, for_sender).await?;
    Ok(())
}
