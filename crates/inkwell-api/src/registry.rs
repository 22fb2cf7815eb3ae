//! Enrichment registry.
//!
//! Keeps the enrichment of the latest turn of every session so clients can
//! poll for it after the turn response went out. Tracking a newer turn of a
//! session cancels the one it replaces, unless the newer turn kept the scene
//! while the replaced turn was still painting it: the pending art and image
//! then carry forward into the newer turn's report. Settled reports are
//! dropped after a retention period, sooner once the session has ended.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use inkwell_enrichment::outcome::{
    ArtOutcome, EnrichmentReport, EnrichmentTag, ImageOutcome, VoiceOutcome,
};
use inkwell_enrichment::pipeline::EnrichmentHandle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// How long a settled report stays available.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);

/// How long the settled report of a finished session stays available.
pub const DEFAULT_TERMINAL_RETENTION: Duration = Duration::from_secs(60);

type Sessions = Arc<Mutex<HashMap<Uuid, Tracked>>>;
type ReportSender = Arc<watch::Sender<EnrichmentReport>>;

#[derive(Debug)]
struct Tracked {
    turn_number: u32,
    report: watch::Receiver<EnrichmentReport>,
    /// Everything feeding this report, including carried-forward work.
    feeds: Vec<CancellationToken>,
    /// Cancelled once the entry is replaced.
    retired: CancellationToken,
}

/// Latest enrichment per session.
#[derive(Debug)]
pub struct EnrichmentRegistry {
    sessions: Sessions,
    retention: Duration,
    terminal_retention: Duration,
}

impl Default for EnrichmentRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION, DEFAULT_TERMINAL_RETENTION)
    }
}

impl EnrichmentRegistry {
    /// Creates an empty registry with the default retention.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry keeping settled reports for `retention`,
    /// or for `terminal_retention` when the turn ended the game.
    #[must_use]
    pub fn with_retention(retention: Duration, terminal_retention: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            retention,
            terminal_retention,
        }
    }

    /// Starts following `handle`, replacing whatever was tracked for the
    /// same session. `terminal` marks the turn that ended the game.
    pub fn track(&self, handle: EnrichmentHandle, terminal: bool) {
        let tag = handle.tag();
        let mut feeds = vec![handle.cancellation_token()];
        let mut carry_from = None;

        let mut sessions = lock(&self.sessions);
        if let Some(previous) = sessions.remove(&tag.session_id) {
            previous.retired.cancel();
            let visuals_pending = !previous.report.borrow().visuals_settled();
            if visuals_pending && !handle.includes_art() {
                debug!(
                    session_id = %tag.session_id,
                    from_turn = previous.turn_number,
                    to_turn = tag.turn_number,
                    "carrying pending visuals forward"
                );
                feeds.extend(previous.feeds);
                carry_from = Some(previous.report);
            } else {
                debug!(
                    session_id = %tag.session_id,
                    turn_number = previous.turn_number,
                    "superseded enrichment cancelled"
                );
                for token in &previous.feeds {
                    token.cancel();
                }
            }
        }

        let carrying = carry_from.is_some();
        let (sender, receiver) = watch::channel(EnrichmentReport::pending(
            tag,
            handle.includes_art() || carrying,
        ));
        let sender = Arc::new(sender);
        if let Some(from) = carry_from {
            let carry = CancellationToken::new();
            feeds.push(carry.clone());
            tokio::spawn(carry_visuals(from, Arc::clone(&sender), carry));
        }
        tokio::spawn(follow(handle, sender, !carrying));

        let retired = CancellationToken::new();
        let retention = if terminal {
            self.terminal_retention
        } else {
            self.retention
        };
        tokio::spawn(expire(
            Arc::clone(&self.sessions),
            tag,
            receiver.clone(),
            retired.clone(),
            retention,
        ));

        sessions.insert(
            tag.session_id,
            Tracked {
                turn_number: tag.turn_number,
                report: receiver,
                feeds,
                retired,
            },
        );
    }

    /// The current report of `turn_number` in `session_id`, if that turn is
    /// the one tracked.
    #[must_use]
    pub fn snapshot(&self, session_id: Uuid, turn_number: u32) -> Option<EnrichmentReport> {
        self.receiver(session_id, turn_number)
            .map(|receiver| receiver.borrow().clone())
    }

    /// Waits up to `wait` for the report to settle and returns it, settled
    /// or not. `None` when the turn is not tracked.
    pub async fn wait_settled(
        &self,
        session_id: Uuid,
        turn_number: u32,
        wait: Duration,
    ) -> Option<EnrichmentReport> {
        let mut receiver = self.receiver(session_id, turn_number)?;
        // Both a timeout and a finished follower leave the latest value behind.
        let _ = tokio::time::timeout(wait, receiver.wait_for(EnrichmentReport::is_settled)).await;
        let report = receiver.borrow().clone();
        Some(report)
    }

    /// Number of sessions tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Whether no session is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.sessions).is_empty()
    }

    /// The turn currently tracked for `session_id`.
    #[must_use]
    pub fn tracked_turn(&self, session_id: Uuid) -> Option<EnrichmentTag> {
        lock(&self.sessions).get(&session_id).map(|t| EnrichmentTag {
            session_id,
            turn_number: t.turn_number,
        })
    }

    fn receiver(
        &self,
        session_id: Uuid,
        turn_number: u32,
    ) -> Option<watch::Receiver<EnrichmentReport>> {
        lock(&self.sessions)
            .get(&session_id)
            .filter(|t| t.turn_number == turn_number)
            .map(|t| t.report.clone())
    }
}

fn lock(sessions: &Mutex<HashMap<Uuid, Tracked>>) -> MutexGuard<'_, HashMap<Uuid, Tracked>> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records the handle's updates. Without `owns_visuals` the art and image
/// slots belong to a carried-forward turn and are left alone.
async fn follow(mut handle: EnrichmentHandle, sender: ReportSender, owns_visuals: bool) {
    while let Some(update) = handle.next_update().await {
        sender.send_modify(|report| report.record(update.kind));
    }
    sender.send_modify(|report| {
        if owns_visuals {
            *report = report.clone().settle_cancelled();
        } else {
            report.voice.get_or_insert(VoiceOutcome::Cancelled);
        }
    });
}

/// Copies the art and image of `from` into `to` once they resolve.
async fn carry_visuals(
    mut from: watch::Receiver<EnrichmentReport>,
    to: ReportSender,
    token: CancellationToken,
) {
    let cancelled = tokio::select! {
        () = token.cancelled() => true,
        _ = from.wait_for(EnrichmentReport::visuals_settled) => false,
    };
    let (art, image) = if cancelled {
        (None, None)
    } else {
        let report = from.borrow();
        (report.art.clone(), report.image.clone())
    };
    to.send_modify(|report| {
        report.art = Some(art.unwrap_or(ArtOutcome::Cancelled));
        report.image = Some(image.unwrap_or(ImageOutcome::Cancelled));
    });
}

/// Drops the entry for `tag` once its report settled and `retention`
/// passed, unless it was replaced first.
async fn expire(
    sessions: Sessions,
    tag: EnrichmentTag,
    mut report: watch::Receiver<EnrichmentReport>,
    retired: CancellationToken,
    retention: Duration,
) {
    let lapsed = async {
        let _ = report.wait_for(EnrichmentReport::is_settled).await;
        tokio::time::sleep(retention).await;
    };
    tokio::select! {
        () = retired.cancelled() => {}
        () = lapsed => {
            let mut sessions = lock(&sessions);
            let current = sessions
                .get(&tag.session_id)
                .is_some_and(|t| t.turn_number == tag.turn_number);
            if current {
                sessions.remove(&tag.session_id);
                debug!(
                    session_id = %tag.session_id,
                    turn_number = tag.turn_number,
                    "settled enrichment evicted"
                );
            }
        }
    }
}
