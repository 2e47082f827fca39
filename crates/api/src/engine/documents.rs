//! Verification document metadata and admin review.
//!
//! Files are stored elsewhere; only their reference is recorded here.

use qgig_core::documents::{validate_file_reference, DocumentStatus, DocumentType};
use qgig_core::error::{CoreError, StateConflict};
use qgig_core::notifications;
use qgig_core::types::DbId;
use qgig_db::models::document::{CreateDocument, Document};
use serde::Deserialize;

use super::uow::UnitOfWork;
use crate::error::AppResult;
use crate::notifications::dispatcher::notify;

/// Request body for `POST /documents`.
#[derive(Debug, Deserialize)]
pub struct RegisterDocument {
    pub document_type: DocumentType,
    pub file_path: String,
    pub file_name: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    fn status(self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Approved,
            Self::Reject => DocumentStatus::Rejected,
        }
    }
}

/// Request body for `POST /admin/documents/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewDocument {
    pub action: ReviewAction,
    pub notes: Option<String>,
}

pub async fn register(
    uow: &mut UnitOfWork,
    user_id: DbId,
    input: &RegisterDocument,
) -> AppResult<Document> {
    validate_file_reference(&input.file_path, &input.file_name).map_err(CoreError::Validation)?;
    if input.file_size.is_some_and(|size| size < 0) {
        return Err(CoreError::Validation("file_size must not be negative".into()).into());
    }

    let document = uow
        .tx
        .create_document(&CreateDocument {
            user_id,
            document_type: input.document_type,
            file_path: input.file_path.trim().to_string(),
            file_name: input.file_name.trim().to_string(),
            file_size: input.file_size,
            mime_type: input.mime_type.clone(),
        })
        .await?;
    tracing::info!(document_id = document.id, user_id, "Document registered");
    Ok(document)
}

/// Approve or reject a pending document and tell its owner.
pub async fn review(
    uow: &mut UnitOfWork,
    reviewer_id: DbId,
    document_id: DbId,
    input: &ReviewDocument,
) -> AppResult<Document> {
    let document = uow
        .tx
        .find_document(document_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Document",
            id: document_id,
        })?;
    if document.status != DocumentStatus::Pending {
        return Err(StateConflict::DocumentAlreadyReviewed.into());
    }

    let status = input.action.status();
    let document = uow
        .tx
        .review_document(document_id, status, reviewer_id, input.notes.as_deref())
        .await?;

    notify(
        uow,
        document.user_id,
        notifications::document_reviewed(
            document.document_type.as_str(),
            status == DocumentStatus::Approved,
        ),
        None,
    )
    .await?;

    tracing::info!(document_id, reviewer_id, status = %status, "Document reviewed");
    Ok(document)
}

pub async fn my_documents(uow: &mut UnitOfWork, user_id: DbId) -> AppResult<Vec<Document>> {
    Ok(uow.tx.list_documents_for_user(user_id).await?)
}

pub async fn pending_documents(uow: &mut UnitOfWork) -> AppResult<Vec<Document>> {
    Ok(uow.tx.list_pending_documents().await?)
}
