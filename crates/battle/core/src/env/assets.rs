//! Asynchronous graphic loading boundary.
//!
//! Graphics are requested through an [`AssetLoader`] and become ready on some
//! later frame, when the loader sends an [`AssetReady`] through the
//! [`AssetNotifier`] it was handed. The scene drains completions without
//! blocking at the start of every frame; until a graphic is ready the battle
//! proceeds with placeholder visuals, and a failed load falls back to the
//! default visual for good.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel};

use crate::error::{BattleError, ErrorSeverity};
use crate::state::BattlerId;

/// Identifies one graphic request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetHandle(pub u32);

/// Why a graphic could not be delivered.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("graphic '{0}' not found")]
    NotFound(String),

    #[error("graphic '{name}' could not be decoded: {reason}")]
    Decode { name: String, reason: String },
}

impl BattleError for AssetError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ASSET_NOT_FOUND",
            Self::Decode { .. } => "ASSET_DECODE",
        }
    }
}

/// Completion message for a graphic request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetReady {
    pub handle: AssetHandle,
    pub result: Result<(), AssetError>,
}

/// One-shot completion sender handed to the loader with each request.
#[derive(Debug)]
pub struct AssetNotifier {
    handle: AssetHandle,
    tx: UnboundedSender<AssetReady>,
}

impl AssetNotifier {
    pub fn handle(&self) -> AssetHandle {
        self.handle
    }

    /// Delivers the result. A scene that was already torn down is ignored.
    pub fn notify(self, result: Result<(), AssetError>) {
        let handle = self.handle;
        if self.tx.send(AssetReady { handle, result }).is_err() {
            tracing::trace!(?handle, "graphic completed after the battle scene closed");
        }
    }
}

/// Issues graphic requests. Completion is reported through the notifier,
/// possibly synchronously, possibly many frames later.
pub trait AssetLoader {
    fn request_graphic(&mut self, name: &str, notifier: AssetNotifier);
}

/// What a requested graphic is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphicOwner {
    /// Shared battle UI graphics (gauges, cursors, damage digits).
    System,
    Battler(BattlerId),
}

/// Load state of one requested graphic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GraphicStatus {
    /// Not delivered yet; placeholder visuals are in use.
    Pending,
    Ready,
    /// Loading failed; the default visual is used.
    Fallback,
}

#[derive(Clone, Debug)]
struct GraphicSlot {
    handle: AssetHandle,
    name: String,
    owner: GraphicOwner,
    status: GraphicStatus,
}

/// A graphic whose request just resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedGraphic {
    pub owner: GraphicOwner,
    pub name: String,
    pub status: GraphicStatus,
}

/// Bookkeeping for outstanding graphic requests of one scene.
#[derive(Debug)]
pub struct AssetTracker {
    tx: UnboundedSender<AssetReady>,
    rx: UnboundedReceiver<AssetReady>,
    slots: Vec<GraphicSlot>,
    next_handle: u32,
}

impl AssetTracker {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            tx,
            rx,
            slots: Vec::new(),
            next_handle: 1,
        }
    }

    /// Requests a graphic and records it as pending.
    pub fn request(
        &mut self,
        loader: &mut dyn AssetLoader,
        name: &str,
        owner: GraphicOwner,
    ) -> AssetHandle {
        let handle = AssetHandle(self.next_handle);
        self.next_handle += 1;
        self.slots.push(GraphicSlot {
            handle,
            name: name.to_owned(),
            owner,
            status: GraphicStatus::Pending,
        });

        tracing::debug!(?handle, name, ?owner, "requesting graphic");
        loader.request_graphic(
            name,
            AssetNotifier {
                handle,
                tx: self.tx.clone(),
            },
        );
        handle
    }

    /// Drains every completion delivered so far without blocking.
    pub fn poll(&mut self) -> Vec<ResolvedGraphic> {
        let mut resolved = Vec::new();
        loop {
            let ready = match self.rx.try_recv() {
                Ok(ready) => ready,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };

            let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.handle == ready.handle && s.status == GraphicStatus::Pending)
            else {
                tracing::trace!(handle = ?ready.handle, "ignoring stale graphic completion");
                continue;
            };

            slot.status = match ready.result {
                Ok(()) => GraphicStatus::Ready,
                Err(error) => {
                    crate::error::log_error(&error, "graphic fell back to default");
                    tracing::warn!(name = %slot.name, "graphic unavailable, using default visual");
                    GraphicStatus::Fallback
                }
            };
            resolved.push(ResolvedGraphic {
                owner: slot.owner,
                name: slot.name.clone(),
                status: slot.status,
            });
        }
        resolved
    }

    /// Load state of the graphic most recently requested for `owner`.
    pub fn status(&self, owner: GraphicOwner) -> Option<GraphicStatus> {
        self.slots
            .iter()
            .rev()
            .find(|s| s.owner == owner)
            .map(|s| s.status)
    }

    /// Number of requests still waiting on the loader.
    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == GraphicStatus::Pending)
            .count()
    }
}

impl Default for AssetTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Loader that completes every request immediately and successfully.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateLoader;

impl AssetLoader for ImmediateLoader {
    fn request_graphic(&mut self, _name: &str, notifier: AssetNotifier) {
        notifier.notify(Ok(()));
    }
}
