//! Per-item preview lifecycle: one lazy, visibility-triggered signed-URL
//! prefetch with best-effort poster capture, plus hover/tap playback.
//!
//! [`PreviewCard`] is the pure state machine; it turns observed events into
//! [`PlayerCommand`]s for the host's media element and effect requests for
//! the async driver. [`PreviewController`] is that driver: it runs the
//! signed-URL resolution and poster capture off-task and feeds completions
//! back in as events. Late completions for an unmounted item land in a
//! closed channel and are dropped, which is the whole teardown story.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::client::api::LinkResolver;
use crate::client::poster::{encode_poster, PosterSource};
use crate::client::sound::SoundIntent;

/// Side effects for the host to apply to its media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    SetSource(String),
    SetPoster(String),
    SetMuted(bool),
    Play,
    Pause { rewind: bool },
}

/// Observed interactions and async completions for one catalog item.
#[derive(Debug)]
pub enum CardEvent {
    /// The item entered the viewport (with lookahead margin).
    EnteredViewport,
    HoverStart,
    HoverEnd,
    /// Touch tap; toggles playback.
    Tap,
    /// The item's own sound button.
    SoundToggle,
    /// Signed-URL resolution finished; None means it failed.
    UrlResolved(Option<String>),
    /// Poster capture finished; None is the normal "no poster" outcome.
    PosterReady(Option<String>),
    /// The item left the tree; the controller stops.
    Unmounted,
}

/// What the machine asks its driver to do besides element commands.
#[derive(Debug, Default)]
pub struct Effects {
    pub commands: Vec<PlayerCommand>,
    /// Start a signed-URL resolution for this item.
    pub resolve_url: bool,
    /// Start a best-effort poster capture against this URL.
    pub capture_poster: Option<String>,
}

/// State machine for one item's preview.
#[derive(Debug)]
pub struct PreviewCard {
    asset_id: Uuid,
    preview_url: Option<String>,
    poster: Option<String>,
    /// One-shot guard: the visibility-triggered prefetch fires at most once
    /// per item instance, no matter how often it re-enters the viewport.
    prefetched: bool,
    resolving: bool,
    pending_play: bool,
    want_poster: bool,
    playing: bool,
    muted: bool,
    sound: SoundIntent,
}

impl PreviewCard {
    /// Binds the item's mute flag from the shared intent at construction.
    pub fn new(asset_id: Uuid, sound: SoundIntent) -> Self {
        let muted = !sound.is_enabled();
        Self {
            asset_id,
            preview_url: None,
            poster: None,
            prefetched: false,
            resolving: false,
            pending_play: false,
            want_poster: false,
            playing: false,
            muted,
            sound,
        }
    }

    pub fn apply(&mut self, event: CardEvent) -> Effects {
        let mut fx = Effects::default();
        match event {
            CardEvent::EnteredViewport => {
                if self.prefetched {
                    return fx;
                }
                self.prefetched = true;
                match &self.preview_url {
                    // Hover beat the viewport to the URL; only the poster
                    // is still missing.
                    Some(url) if self.poster.is_none() => {
                        fx.capture_poster = Some(url.clone());
                    }
                    Some(_) => {}
                    None => {
                        self.want_poster = true;
                        self.start_resolve(&mut fx);
                    }
                }
            }
            CardEvent::HoverStart => {
                if self.preview_url.is_some() {
                    self.playing = true;
                    fx.commands.push(PlayerCommand::Play);
                } else {
                    self.pending_play = true;
                    self.start_resolve(&mut fx);
                }
            }
            CardEvent::HoverEnd => {
                self.pending_play = false;
                if self.playing {
                    self.playing = false;
                    fx.commands.push(PlayerCommand::Pause { rewind: true });
                }
            }
            CardEvent::Tap => {
                if self.playing {
                    self.playing = false;
                    fx.commands.push(PlayerCommand::Pause { rewind: false });
                } else if self.preview_url.is_some() {
                    self.playing = true;
                    fx.commands.push(PlayerCommand::Play);
                } else {
                    self.pending_play = true;
                    self.start_resolve(&mut fx);
                }
            }
            CardEvent::SoundToggle => {
                let enabled = self.muted;
                // The toggle updates the shared default for items that bind
                // later, and this item's own element; already-bound items
                // are left alone.
                self.sound.set(enabled);
                self.muted = !enabled;
                fx.commands.push(PlayerCommand::SetMuted(self.muted));
                if enabled && self.preview_url.is_some() && !self.playing {
                    self.playing = true;
                    fx.commands.push(PlayerCommand::Play);
                }
            }
            CardEvent::UrlResolved(result) => {
                self.resolving = false;
                match result {
                    Some(url) => {
                        let first = self.preview_url.is_none();
                        self.preview_url = Some(url.clone());
                        if first {
                            fx.commands.push(PlayerCommand::SetSource(url.clone()));
                            fx.commands.push(PlayerCommand::SetMuted(self.muted));
                        }
                        if self.pending_play {
                            self.pending_play = false;
                            self.playing = true;
                            fx.commands.push(PlayerCommand::Play);
                        }
                        if self.want_poster && self.poster.is_none() {
                            self.want_poster = false;
                            fx.capture_poster = Some(url);
                        }
                    }
                    None => {
                        // Placeholder stays up, playback stays unavailable.
                        // A later hover or tap may try again; the viewport
                        // prefetch never refires.
                        self.pending_play = false;
                        self.want_poster = false;
                    }
                }
            }
            CardEvent::PosterReady(poster) => {
                if let Some(data_url) = poster {
                    if self.poster.is_none() {
                        self.poster = Some(data_url.clone());
                        fx.commands.push(PlayerCommand::SetPoster(data_url));
                    }
                }
            }
            CardEvent::Unmounted => {}
        }
        fx
    }

    /// Re-apply this item's mute flag from the shared intent. Hosts call
    /// this on the page-level autoplay unlock (first click); items that
    /// already diverged through their own toggle are simply re-synced to
    /// the shared default at that moment.
    pub fn sync_sound(&mut self) -> Effects {
        let mut fx = Effects::default();
        let muted = !self.sound.is_enabled();
        if muted != self.muted {
            self.muted = muted;
            fx.commands.push(PlayerCommand::SetMuted(muted));
        }
        fx
    }

    fn start_resolve(&mut self, fx: &mut Effects) {
        if self.resolving || self.preview_url.is_some() {
            return;
        }
        self.resolving = true;
        fx.resolve_url = true;
    }

    pub fn asset_id(&self) -> Uuid {
        self.asset_id
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn poster(&self) -> Option<&str> {
        self.poster.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

/// Cloneable handle the host wires its DOM callbacks to.
#[derive(Clone)]
pub struct CardHandle {
    tx: mpsc::Sender<CardEvent>,
}

impl CardHandle {
    pub async fn entered_viewport(&self) {
        let _ = self.tx.send(CardEvent::EnteredViewport).await;
    }

    pub async fn hover_start(&self) {
        let _ = self.tx.send(CardEvent::HoverStart).await;
    }

    pub async fn hover_end(&self) {
        let _ = self.tx.send(CardEvent::HoverEnd).await;
    }

    pub async fn tap(&self) {
        let _ = self.tx.send(CardEvent::Tap).await;
    }

    pub async fn toggle_sound(&self) {
        let _ = self.tx.send(CardEvent::SoundToggle).await;
    }

    pub async fn unmount(&self) {
        let _ = self.tx.send(CardEvent::Unmounted).await;
    }
}

/// Async driver for one item: executes the machine's effect requests and
/// feeds completions back in. Each item's controller is independent; there
/// is no cross-item cap because viewport proximity already limits how many
/// run at once.
pub struct PreviewController {
    card: PreviewCard,
    resolver: Arc<dyn LinkResolver>,
    posters: Arc<dyn PosterSource>,
    events_tx: mpsc::Sender<CardEvent>,
    events_rx: mpsc::Receiver<CardEvent>,
    commands_tx: mpsc::Sender<PlayerCommand>,
}

impl PreviewController {
    pub fn new(
        asset_id: Uuid,
        resolver: Arc<dyn LinkResolver>,
        posters: Arc<dyn PosterSource>,
        sound: SoundIntent,
    ) -> (Self, CardHandle, mpsc::Receiver<PlayerCommand>) {
        let (events_tx, events_rx) = mpsc::channel(32);
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let controller = Self {
            card: PreviewCard::new(asset_id, sound),
            resolver,
            posters,
            events_tx: events_tx.clone(),
            events_rx,
            commands_tx,
        };
        (controller, CardHandle { tx: events_tx }, commands_rx)
    }

    pub async fn run(mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, CardEvent::Unmounted) {
                break;
            }
            let fx = self.card.apply(event);
            if !self.execute(fx).await {
                break;
            }
        }
        debug!(asset_id = %self.card.asset_id(), "preview controller stopped");
    }

    /// Returns false once the host dropped the command receiver — the item
    /// is gone and any in-flight results are irrelevant.
    async fn execute(&mut self, fx: Effects) -> bool {
        for command in fx.commands {
            if self.commands_tx.send(command).await.is_err() {
                return false;
            }
        }

        if fx.resolve_url {
            let resolver = self.resolver.clone();
            let tx = self.events_tx.clone();
            let asset_id = self.card.asset_id();
            tokio::spawn(async move {
                let url = match resolver.resolve(asset_id).await {
                    Ok(link) => Some(link.url),
                    Err(err) => {
                        debug!(asset_id = %asset_id, error = %err, "preview url resolution failed");
                        None
                    }
                };
                let _ = tx.send(CardEvent::UrlResolved(url)).await;
            });
        }

        if let Some(url) = fx.capture_poster {
            let posters = self.posters.clone();
            let tx = self.events_tx.clone();
            tokio::spawn(async move {
                let poster = posters
                    .grab_frame(&url)
                    .await
                    .as_ref()
                    .and_then(encode_poster);
                let _ = tx.send(CardEvent::PosterReady(poster)).await;
            });
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::poster::RawFrame;
    use crate::models::DownloadLink;
    use crate::types::{AppError, AppResult};
    use async_trait::async_trait;
    use std::time::Duration;

    fn card() -> PreviewCard {
        PreviewCard::new(Uuid::new_v4(), SoundIntent::new())
    }

    fn resolved(card: &mut PreviewCard, url: &str) -> Effects {
        card.apply(CardEvent::UrlResolved(Some(url.to_string())))
    }

    #[test]
    fn test_prefetch_fires_exactly_once() {
        let mut card = card();

        let fx = card.apply(CardEvent::EnteredViewport);
        assert!(fx.resolve_url);

        // Scrolled away and back, many times.
        for _ in 0..5 {
            let fx = card.apply(CardEvent::EnteredViewport);
            assert!(!fx.resolve_url);
            assert!(fx.capture_poster.is_none());
            assert!(fx.commands.is_empty());
        }
    }

    #[test]
    fn test_prefetch_sets_source_then_captures_poster() {
        let mut card = card();
        card.apply(CardEvent::EnteredViewport);

        let fx = resolved(&mut card, "https://store/signed");
        assert_eq!(
            fx.commands,
            vec![
                PlayerCommand::SetSource("https://store/signed".to_string()),
                PlayerCommand::SetMuted(true),
            ]
        );
        assert_eq!(fx.capture_poster.as_deref(), Some("https://store/signed"));

        let fx = card.apply(CardEvent::PosterReady(Some("data:image/jpeg;base64,xyz".into())));
        assert_eq!(
            fx.commands,
            vec![PlayerCommand::SetPoster("data:image/jpeg;base64,xyz".to_string())]
        );
        assert_eq!(card.poster(), Some("data:image/jpeg;base64,xyz"));
    }

    #[test]
    fn test_missing_poster_is_a_quiet_terminal_state() {
        let mut card = card();
        card.apply(CardEvent::EnteredViewport);
        resolved(&mut card, "https://store/signed");

        let fx = card.apply(CardEvent::PosterReady(None));
        assert!(fx.commands.is_empty());
        assert_eq!(card.poster(), None);
    }

    #[test]
    fn test_hover_waits_for_resolution_then_plays() {
        let mut card = card();

        let fx = card.apply(CardEvent::HoverStart);
        assert!(fx.resolve_url);
        assert!(fx.commands.is_empty());

        // While resolving, the viewport prefetch must not start a second
        // resolution.
        let fx = card.apply(CardEvent::EnteredViewport);
        assert!(!fx.resolve_url);

        let fx = resolved(&mut card, "https://store/signed");
        assert!(fx.commands.contains(&PlayerCommand::Play));
        assert!(card.is_playing());
    }

    #[test]
    fn test_hover_end_pauses_and_rewinds() {
        let mut card = card();
        card.apply(CardEvent::EnteredViewport);
        resolved(&mut card, "https://store/signed");

        card.apply(CardEvent::HoverStart);
        let fx = card.apply(CardEvent::HoverEnd);
        assert_eq!(fx.commands, vec![PlayerCommand::Pause { rewind: true }]);
        assert!(!card.is_playing());
    }

    #[test]
    fn test_hover_end_before_resolution_cancels_the_pending_play() {
        let mut card = card();

        card.apply(CardEvent::HoverStart);
        card.apply(CardEvent::HoverEnd);

        let fx = resolved(&mut card, "https://store/signed");
        assert!(!fx.commands.contains(&PlayerCommand::Play));
        assert!(!card.is_playing());
    }

    #[test]
    fn test_tap_toggles_playback() {
        let mut card = card();

        // First tap resolves, then plays.
        let fx = card.apply(CardEvent::Tap);
        assert!(fx.resolve_url);
        let fx = resolved(&mut card, "https://store/signed");
        assert!(fx.commands.contains(&PlayerCommand::Play));

        // Second tap pauses without rewinding.
        let fx = card.apply(CardEvent::Tap);
        assert_eq!(fx.commands, vec![PlayerCommand::Pause { rewind: false }]);

        // Third tap resumes from the reused URL, no new resolution.
        let fx = card.apply(CardEvent::Tap);
        assert!(!fx.resolve_url);
        assert_eq!(fx.commands, vec![PlayerCommand::Play]);
    }

    #[test]
    fn test_failed_resolution_leaves_placeholder_and_allows_retry() {
        let mut card = card();

        card.apply(CardEvent::EnteredViewport);
        let fx = card.apply(CardEvent::UrlResolved(None));
        assert!(fx.commands.is_empty());
        assert_eq!(card.preview_url(), None);

        // The viewport one-shot never refires...
        let fx = card.apply(CardEvent::EnteredViewport);
        assert!(!fx.resolve_url);

        // ...but an explicit hover tries again.
        let fx = card.apply(CardEvent::HoverStart);
        assert!(fx.resolve_url);
    }

    #[test]
    fn test_sound_defaults_and_toggle() {
        let intent = SoundIntent::new();
        let mut card = PreviewCard::new(Uuid::new_v4(), intent.clone());
        assert!(card.is_muted());

        let fx = card.apply(CardEvent::SoundToggle);
        assert!(fx.commands.contains(&PlayerCommand::SetMuted(false)));
        assert!(!card.is_muted());
        assert!(intent.is_enabled());

        // An item binding after the toggle starts unmuted.
        let late = PreviewCard::new(Uuid::new_v4(), intent.clone());
        assert!(!late.is_muted());
    }

    #[test]
    fn test_toggle_does_not_ripple_into_other_bound_items() {
        let intent = SoundIntent::new();
        let mut first = PreviewCard::new(Uuid::new_v4(), intent.clone());
        let second = PreviewCard::new(Uuid::new_v4(), intent.clone());

        first.apply(CardEvent::SoundToggle);
        // The second item's own state is untouched until it re-binds.
        assert!(second.is_muted());
    }

    #[test]
    fn test_page_level_unlock_resyncs_via_sync_sound() {
        let intent = SoundIntent::new();
        let mut card = PreviewCard::new(Uuid::new_v4(), intent.clone());
        assert!(card.is_muted());

        // First click anywhere on the page.
        intent.enable();
        let fx = card.sync_sound();
        assert_eq!(fx.commands, vec![PlayerCommand::SetMuted(false)]);
        assert!(!card.is_muted());

        // Already in sync: no command churn.
        assert!(card.sync_sound().commands.is_empty());
    }

    struct FakeResolver {
        url: String,
    }

    #[async_trait]
    impl LinkResolver for FakeResolver {
        async fn resolve(&self, _asset_id: Uuid) -> AppResult<DownloadLink> {
            Ok(DownloadLink {
                url: self.url.clone(),
                filename: "clip".to_string(),
                media_type: "video/mp4".to_string(),
            })
        }
    }

    struct BrokenResolver;

    #[async_trait]
    impl LinkResolver for BrokenResolver {
        async fn resolve(&self, _asset_id: Uuid) -> AppResult<DownloadLink> {
            Err(AppError::Transport("expired".to_string()))
        }
    }

    struct FakePosters;

    #[async_trait]
    impl PosterSource for FakePosters {
        async fn grab_frame(&self, _url: &str) -> Option<RawFrame> {
            Some(RawFrame { width: 2, height: 2, rgba: vec![128; 16] })
        }
    }

    struct NoPosters;

    #[async_trait]
    impl PosterSource for NoPosters {
        async fn grab_frame(&self, _url: &str) -> Option<RawFrame> {
            None
        }
    }

    async fn drain_until<P>(rx: &mut mpsc::Receiver<PlayerCommand>, predicate: P) -> Vec<PlayerCommand>
    where
        P: Fn(&PlayerCommand) -> bool,
    {
        let mut seen = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(command) = rx.recv().await {
                let done = predicate(&command);
                seen.push(command);
                if done {
                    break;
                }
            }
        })
        .await
        .expect("command never arrived");
        seen
    }

    #[tokio::test]
    async fn test_controller_prefetch_flow_end_to_end() {
        let (controller, handle, mut commands) = PreviewController::new(
            Uuid::new_v4(),
            Arc::new(FakeResolver { url: "https://store/signed".to_string() }),
            Arc::new(FakePosters),
            SoundIntent::new(),
        );
        tokio::spawn(controller.run());

        handle.entered_viewport().await;

        let seen = drain_until(&mut commands, |c| matches!(c, PlayerCommand::SetPoster(_))).await;
        assert!(seen.contains(&PlayerCommand::SetSource("https://store/signed".to_string())));
        assert!(matches!(seen.last(), Some(PlayerCommand::SetPoster(p)) if p.starts_with("data:image/jpeg;base64,")));

        handle.unmount().await;
    }

    #[tokio::test]
    async fn test_controller_swallows_failed_prefetch() {
        let (controller, handle, mut commands) = PreviewController::new(
            Uuid::new_v4(),
            Arc::new(BrokenResolver),
            Arc::new(NoPosters),
            SoundIntent::new(),
        );
        tokio::spawn(controller.run());

        handle.entered_viewport().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // No commands at all: placeholder stays, nothing crashes.
        assert!(commands.try_recv().is_err());

        handle.unmount().await;
    }
}
