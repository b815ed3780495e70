// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote document store abstraction.
//!
//! Provides a trait-based outbound interface so the sync manager can run
//! against the real HTTP store in production and an in-process mock in
//! tests. Every call goes through the [`NetworkClient`] contract and reports
//! failure as a [`NetworkError`] value.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tether_core::{AttachmentRef, RemoteSnapshot};

use super::network::{NetworkClient, NetworkError, RequestConfig};

/// Boxed future returned by [`RemoteStore`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Acknowledgment of a successful write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    /// Server-side time of the write, if the store reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<u64>,
}

/// Outbound interface to the authoritative document store.
pub trait RemoteStore: Send + Sync {
    /// Writes a document snapshot.
    ///
    /// Retryable failures are retried up to `max_retries` times by the
    /// network layer before the error is returned.
    fn push(
        &self,
        document_id: String,
        snapshot: RemoteSnapshot,
        attachment: Option<AttachmentRef>,
        max_retries: u32,
    ) -> BoxFuture<'_, Result<Ack, NetworkError>>;

    /// Reads a document snapshot. Returns `None` if the store has no such document.
    fn fetch(
        &self,
        document_id: String,
    ) -> BoxFuture<'_, Result<Option<RemoteSnapshot>, NetworkError>>;

    /// Uploads a binary attachment and returns its reference.
    fn upload(&self, bytes: Bytes) -> BoxFuture<'_, Result<AttachmentRef, NetworkError>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushBody<'a> {
    document_id: &'a str,
    snapshot: &'a RemoteSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment_ref: Option<&'a AttachmentRef>,
}

#[derive(Deserialize)]
struct UploadReply {
    #[serde(rename = "ref")]
    reference: String,
}

/// Remote store reached over HTTP.
///
/// - `PUT {base}/documents/{id}` with `{documentId, snapshot, attachmentRef}`
/// - `GET {base}/documents/{id}`, 404 meaning not found
/// - `POST {base}/attachments` with the raw bytes, replying `{ref}`
pub struct HttpRemote {
    client: NetworkClient,
    base_url: String,
}

impl HttpRemote {
    pub fn new(client: NetworkClient, base_url: &str) -> Self {
        HttpRemote {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &NetworkClient {
        &self.client
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/documents/{document_id}", self.base_url)
    }
}

impl RemoteStore for HttpRemote {
    fn push(
        &self,
        document_id: String,
        snapshot: RemoteSnapshot,
        attachment: Option<AttachmentRef>,
        max_retries: u32,
    ) -> BoxFuture<'_, Result<Ack, NetworkError>> {
        Box::pin(async move {
            let url = self.document_url(&document_id);
            let body = serde_json::to_value(PushBody {
                document_id: &document_id,
                snapshot: &snapshot,
                attachment_ref: attachment.as_ref(),
            })
            .map_err(|e| NetworkError::decode(0, format!("unencodable snapshot: {e}")))?;
            let config = RequestConfig::put().json(body).retries(max_retries);
            let response = self.client.request(&url, config).await?;
            if response.body.is_empty() {
                return Ok(Ack::default());
            }
            response.json()
        })
    }

    fn fetch(
        &self,
        document_id: String,
    ) -> BoxFuture<'_, Result<Option<RemoteSnapshot>, NetworkError>> {
        Box::pin(async move {
            let url = self.document_url(&document_id);
            match self.client.request(&url, RequestConfig::get()).await {
                Ok(response) => response.json().map(Some),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn upload(&self, bytes: Bytes) -> BoxFuture<'_, Result<AttachmentRef, NetworkError>> {
        Box::pin(async move {
            let url = format!("{}/attachments", self.base_url);
            let response = self.client.upload(&url, bytes, RequestConfig::post()).await?;
            let reply: UploadReply = response.json()?;
            Ok(AttachmentRef::new(reply.reference))
        })
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
