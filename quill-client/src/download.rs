//! Download resolver.
//!
//! Resolution order for a CID: exact local-cache hit, then a best-effort
//! partial-match scan over cached payloads (the remote index may not have
//! caught up with a recent write), then a network download whose bytes
//! are parsed in memory. Only the network step is authoritative; the
//! partial match is a documented heuristic degrade path.

use std::sync::Arc;

use quill_core::{Cid, DownloadError, Note, QuillError, QuillResult};
use quill_store::NoteCache;
use tracing::{debug, warn};

use crate::network::StorageNetwork;

/// The download resolver.
pub struct Downloader {
    cache: NoteCache,
    network: Arc<dyn StorageNetwork>,
}

impl Downloader {
    pub fn new(cache: NoteCache, network: Arc<dyn StorageNetwork>) -> Self {
        Self { cache, network }
    }

    /// Resolve a CID to its note.
    pub async fn download(&self, cid: &Cid) -> QuillResult<Note> {
        if !cid.is_valid() {
            return Err(DownloadError::InvalidCid.into());
        }

        // Fast path: exact cache hit. Cache trouble here degrades to the
        // network rather than failing the download.
        match self.cache.get_payload(cid) {
            Ok(Some(payload)) => match parse_note(cid, &payload) {
                Ok(note) => {
                    debug!(%cid, "resolved note from local cache");
                    return Ok(note);
                }
                Err(e) => warn!(%cid, error = %e, "cached payload is malformed, ignoring"),
            },
            Ok(None) => {}
            Err(e) => warn!(%cid, error = %e, "local cache read failed, falling back"),
        }

        // Degrade path: scan cached payloads for a note whose id carries
        // the CID's trailing characters. Best-effort, not authoritative.
        if let Some(note) = self.partial_match(cid) {
            warn!(%cid, note_id = %note.id, "resolved note by partial cache match");
            return Ok(note);
        }

        debug!(%cid, "no local match, downloading from network");
        let bytes = self
            .network
            .download(cid, true)
            .await
            .map_err(|e| match e {
                // Already classified by the adapter; don't double-wrap
                QuillError::Download(err) => err,
                other => DownloadError::Failed {
                    cid: cid.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let note = parse_note(cid, &bytes)?;

        // Back-fill the cache so the next resolve is local.
        if let Err(e) = self.cache.put_payload(cid, &bytes) {
            warn!(%cid, error = %e, "failed to cache downloaded payload");
        }

        Ok(note)
    }

    fn partial_match(&self, cid: &Cid) -> Option<Note> {
        let entries = match self.cache.scan_payloads() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "local cache scan failed");
                return None;
            }
        };

        // Note ids embed the EIP-55 checksummed (mixed-case) address while
        // a root hash is lowercase hex, so the comparison must be
        // case-insensitive.
        let suffix = cid.suffix().to_lowercase();
        for (cached_cid, payload) in entries {
            match serde_json::from_slice::<Note>(&payload) {
                Ok(note) if note.id.to_lowercase().contains(&suffix) => return Some(note),
                Ok(_) => {}
                Err(e) => {
                    warn!(cid = %cached_cid, error = %e, "skipping malformed cached payload");
                }
            }
        }
        None
    }
}

fn parse_note(cid: &Cid, payload: &[u8]) -> Result<Note, DownloadError> {
    serde_json::from_slice(payload).map_err(|e| DownloadError::MalformedPayload {
        cid: cid.to_string(),
        reason: e.to_string(),
    })
}
