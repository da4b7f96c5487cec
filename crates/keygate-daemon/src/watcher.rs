//! Event log watcher
//!
//! Drains an outbox subscription and answers request records by asking the
//! signer backend for a key or signature, then posting the resolution back to
//! the gate, through its proxy, as the signer identity.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use keygate_core::{Address, Error, Event, PayloadKind};
use keygate_ledger::{Call, LogRecord, Proxy, SignatureResolution};

use crate::error::{DaemonError, Result};
use crate::signer::{SignerBackend, SigningRequest};

/// Proxied gate shared between callers and the watcher
pub type SharedGate = Arc<Mutex<Proxy>>;

/// What the watcher did with a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// Not a request, or nothing to do
    Ignored,

    /// A key was resolved at this index
    KeyResolved { index: u64 },

    SignatureResolved,

    /// Another resolution filled the slot first
    LostRace { expected: u64, provided: u64 },
}

pub struct Watcher<B> {
    gate: SharedGate,
    identity: Address,
    backend: B,
    records: mpsc::UnboundedReceiver<LogRecord>,
}

impl<B: SignerBackend> Watcher<B> {
    pub fn new(
        gate: SharedGate,
        identity: Address,
        backend: B,
        records: mpsc::UnboundedReceiver<LogRecord>,
    ) -> Self {
        Self {
            gate,
            identity,
            backend,
            records,
        }
    }

    /// Process records until the subscription closes
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Watcher started as {} with {} backend",
            self.identity,
            self.backend.backend_name()
        );

        loop {
            match self.handle_next().await {
                Ok(action) => debug!("Watcher action: {:?}", action),
                Err(DaemonError::ChannelClosed) => break,
                Err(e) => warn!("Failed to serve request: {}", e),
            }
        }

        info!("Watcher stopped");
        Ok(())
    }

    /// Wait for the next record and serve it
    pub async fn handle_next(&mut self) -> Result<WatchAction> {
        let record = self.records.recv().await.ok_or(DaemonError::ChannelClosed)?;
        self.handle(&record).await
    }

    /// Serve every record that is already queued, including ones published
    /// while serving
    pub async fn drain(&mut self) -> Vec<Result<WatchAction>> {
        let mut outcomes = Vec::new();
        while let Ok(record) = self.records.try_recv() {
            outcomes.push(self.handle(&record).await);
        }
        outcomes
    }

    pub async fn handle(&self, record: &LogRecord) -> Result<WatchAction> {
        if !record.event.is_request() {
            return Ok(WatchAction::Ignored);
        }

        let call = Call::from(self.identity);
        match &record.event {
            Event::KeyRequested {
                class_id,
                owner,
                index,
            } => {
                // The announced index is advisory; resolve the slot that is open now
                let next = self.gate.lock().await.gate().next_index(class_id, owner);
                if next != *index {
                    debug!(
                        "Request #{} announced slot {} but slot {} is open",
                        record.sequence, index, next
                    );
                }

                let public_key = self.backend.provision_key(class_id, owner, next).await?;

                let result = self.gate.lock().await.call(&call, |gate, call| {
                    gate.resolve_public_key(call, *class_id, *owner, next, public_key)
                });
                match result {
                    Ok(index) => Ok(WatchAction::KeyResolved { index }),
                    Err(Error::IndexMismatch { expected, provided }) => {
                        warn!(
                            "Lost race resolving slot {} for {} (next is {})",
                            provided, owner, expected
                        );
                        Ok(WatchAction::LostRace { expected, provided })
                    }
                    Err(e) => Err(e.into()),
                }
            }

            Event::SignatureRequested {
                class_id,
                owner,
                index,
                chain_id,
                payload,
                is_hash,
                is_data,
                is_transaction,
                broadcast,
            } => {
                let request = SigningRequest {
                    class_id: *class_id,
                    owner: *owner,
                    index: *index,
                    chain_id: *chain_id,
                    payload: payload.clone(),
                    kind: PayloadKind {
                        is_hash: *is_hash,
                        is_data: *is_data,
                        is_transaction: *is_transaction,
                        broadcast: *broadcast,
                    },
                };
                let signature = self.backend.sign(&request).await?;

                let resolution = SignatureResolution {
                    class_id: request.class_id,
                    owner: request.owner,
                    index: request.index,
                    chain_id: request.chain_id,
                    payload: request.payload,
                    signature,
                    broadcast: request.kind.broadcast,
                };
                self.gate
                    .lock()
                    .await
                    .call(&call, |gate, call| gate.resolve_signature(call, resolution))?;
                Ok(WatchAction::SignatureResolved)
            }

            _ => Ok(WatchAction::Ignored),
        }
    }
}
