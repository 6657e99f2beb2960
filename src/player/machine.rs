//! The player side: executes commands on the video widget and reports back.

use super::errors::{PlaybackError, PlayerError};
use super::fade::{spawn_fade, FadeFinished};
use super::state::{PlayerInput, PlayerState};
use super::widget::{PlayerChrome, VideoWidget, WidgetEvent, WidgetState};
use crate::channel::{
    Command, CommandReceiver, PlayerLink, SharedStore, StatusMessage, StatusSender,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_UNMUTE_DELAY: Duration = Duration::from_secs(1);
pub const IDLE_TITLE: &str = "Jukebox Player";
pub const INIT_TIMEOUT_MESSAGE: &str = "Player Failed to Initialize (Timeout)";

#[derive(Debug, Clone)]
pub struct PlayerSettings {
    pub init_timeout: Duration,
    pub unmute_delay: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            unmute_delay: DEFAULT_UNMUTE_DELAY,
        }
    }
}

struct ActiveFade {
    generation: u64,
    cancel: CancellationToken,
    /// Video that was current when the fade began.
    video_id: Option<String>,
}

pub struct PlayerMachine {
    widget: Arc<dyn VideoWidget>,
    chrome: Arc<dyn PlayerChrome>,
    events: mpsc::Receiver<WidgetEvent>,
    commands: CommandReceiver,
    statuses: StatusSender,
    link: PlayerLink,
    settings: PlayerSettings,
    state: PlayerState,
    state_tx: watch::Sender<PlayerState>,
    current_id: Option<String>,
    fade: Option<ActiveFade>,
    fade_generation: u64,
    fade_done_tx: mpsc::Sender<FadeFinished>,
    fade_done_rx: mpsc::Receiver<FadeFinished>,
    unmute: Option<CancellationToken>,
}

impl PlayerMachine {
    pub fn new(
        widget: Arc<dyn VideoWidget>,
        chrome: Arc<dyn PlayerChrome>,
        events: mpsc::Receiver<WidgetEvent>,
        store: &SharedStore,
        link: PlayerLink,
        settings: PlayerSettings,
    ) -> Self {
        let (fade_done_tx, fade_done_rx) = mpsc::channel(4);
        let (state_tx, _) = watch::channel(PlayerState::Uninitialized);
        Self {
            widget,
            chrome,
            events,
            commands: CommandReceiver::new(store.clone()),
            statuses: StatusSender::new(store.clone()),
            link,
            settings,
            state: PlayerState::Uninitialized,
            state_tx,
            current_id: None,
            fade: None,
            fade_generation: 0,
            fade_done_tx,
            fade_done_rx,
            unmute: None,
        }
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state_tx.subscribe()
    }

    /// Opens the player link and runs the machine on its own task.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<Result<(), PlayerError>> {
        self.link.open();
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), PlayerError> {
        self.transition(PlayerInput::Start);
        let deadline = Instant::now() + self.settings.init_timeout;
        info!("Player initializing, waiting for the video widget");

        let result = loop {
            let waiting = !self.state.is_ready();
            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                _ = tokio::time::sleep_until(deadline), if waiting => {
                    break Err(self.fail_initialization().await);
                }
                event = self.events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        warn!("Video widget event stream closed");
                        break Ok(());
                    }
                },
                command = self.commands.next() => match command {
                    Some(Ok(envelope)) => {
                        debug!("Received command {}", envelope.command.action());
                        self.execute(envelope.command).await;
                    }
                    Some(Err(err)) => warn!("Error parsing command: {}", err),
                    None => break Ok(()),
                },
                Some(finished) = self.fade_done_rx.recv() => self.finish_fade(finished).await,
            }
        };

        self.cancel_fade();
        self.cancel_unmute();
        self.link.close();
        info!("Player stopped");
        result
    }

    fn transition(&mut self, input: PlayerInput) -> bool {
        match self.state.apply(input) {
            Ok(next) => {
                if next != self.state {
                    debug!("Player state {:?} -> {:?}", self.state, next);
                }
                self.state = next;
                self.state_tx.send_replace(next);
                true
            }
            Err(rejected) => {
                debug!("{}", rejected);
                false
            }
        }
    }

    async fn fail_initialization(&mut self) -> PlayerError {
        self.transition(PlayerInput::InitTimeout);
        error!(
            "Player Ready event timed out after {} seconds",
            self.settings.init_timeout.as_secs()
        );
        self.chrome.show_error(INIT_TIMEOUT_MESSAGE).await;
        PlayerError::InitializationTimeout(self.settings.init_timeout)
    }

    async fn handle_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Ready => {
                if !self.transition(PlayerInput::WidgetReady) {
                    return;
                }
                info!("Player ready");
                self.statuses.send(StatusMessage::ready());
                self.widget.play().await;
                self.schedule_unmute(false);
                self.process_stored_command().await;
            }
            WidgetEvent::StateChanged { state, video_id } => {
                if !self.transition(PlayerInput::WidgetState(state)) {
                    return;
                }
                match state {
                    WidgetState::Ended if self.fade.is_none() => {
                        info!("Video ended naturally");
                        self.statuses.send(StatusMessage::ended(self.current_id.take()));
                    }
                    WidgetState::Playing => {
                        if video_id.is_some() {
                            self.current_id = video_id;
                        }
                        self.chrome.reset_overlay().await;
                    }
                    _ => {}
                }
            }
            WidgetEvent::Error(code) => {
                if !self.transition(PlayerInput::WidgetError) {
                    return;
                }
                let err = PlaybackError::from_code(code);
                error!("{}", err);
                self.statuses.send(StatusMessage::error(
                    self.current_id.take(),
                    err.code,
                    err.message.clone(),
                ));
                self.chrome.show_error(&err.to_string()).await;
            }
        }
    }

    /// A command written before the player became ready.
    async fn process_stored_command(&mut self) {
        match self.commands.current() {
            Some(Ok(envelope)) => {
                info!("Found command in storage on ready: {}", envelope.command.action());
                self.execute(envelope.command).await;
            }
            Some(Err(err)) => warn!("Error processing stored command: {}", err),
            None => debug!("No command found in storage on ready"),
        }
    }

    async fn execute(&mut self, command: Command) {
        if !self.transition(PlayerInput::Command) {
            warn!(
                "Player not ready when command '{}' received. Ignoring.",
                command.action()
            );
            return;
        }

        if !matches!(command, Command::FadeOutAndBlack { .. }) {
            self.chrome.reset_overlay().await;
        }

        match command {
            Command::Play {
                video_id,
                title,
                artist,
            } => {
                if video_id.trim().is_empty() {
                    warn!("Invalid 'play' command without video id");
                    return;
                }
                self.cancel_fade();
                info!("Loading video {} ({} - {})", video_id, artist, title);
                self.current_id = Some(video_id.clone());
                self.widget.load(&video_id).await;
                self.widget.play().await;
                self.schedule_unmute(true);
                self.chrome
                    .set_title(&format!("{} - {}", or_unknown(&artist), or_unknown(&title)))
                    .await;
            }
            Command::Stop => {
                info!("Stopping video immediately");
                self.cancel_fade();
                self.cancel_unmute();
                self.chrome.reset_overlay().await;
                self.widget.stop().await;
                self.chrome.set_title(IDLE_TITLE).await;
                self.current_id = None;
            }
            Command::FadeOutAndBlack { fade_duration } => {
                info!("Initiating fadeOutAndBlack over {}ms", fade_duration);
                self.start_fade(fade_duration).await;
            }
        }
    }

    async fn start_fade(&mut self, duration_ms: u64) {
        let volume = self.widget.volume().await;
        let overlay = self.chrome.has_overlay();
        let start_volume = match volume {
            Some(volume) if self.state.is_ready() && self.fade.is_none() && overlay => volume,
            _ => {
                warn!(
                    "Cannot start fade: ready={}, volume={:?}, fading={}, overlay={}",
                    self.state.is_ready(),
                    volume,
                    self.fade.is_some(),
                    overlay
                );
                self.statuses
                    .send(StatusMessage::fade_complete(self.current_id.clone()));
                return;
            }
        };

        self.fade_generation += 1;
        let cancel = CancellationToken::new();
        self.fade = Some(ActiveFade {
            generation: self.fade_generation,
            cancel: cancel.clone(),
            video_id: self.current_id.clone(),
        });

        self.chrome
            .start_overlay_fade(Duration::from_millis(duration_ms))
            .await;
        spawn_fade(
            self.widget.clone(),
            start_volume,
            duration_ms,
            self.fade_generation,
            cancel,
            self.fade_done_tx.clone(),
        );
    }

    async fn finish_fade(&mut self, finished: FadeFinished) {
        if self.fade.as_ref().map(|f| f.generation) != Some(finished.generation) {
            debug!("Ignoring completion of a stale fade");
            return;
        }
        let Some(fade) = self.fade.take() else {
            return;
        };
        self.widget.stop().await;
        self.widget.set_volume(100).await;
        self.statuses
            .send(StatusMessage::fade_complete(fade.video_id.clone()));
        if self.current_id == fade.video_id {
            self.current_id = None;
        }
    }

    fn cancel_fade(&mut self) {
        if let Some(fade) = self.fade.take() {
            debug!("Cancelling fade");
            fade.cancel.cancel();
        }
    }

    fn cancel_unmute(&mut self) {
        if let Some(token) = self.unmute.take() {
            token.cancel();
        }
    }

    /// Unmutes once the widget reports playing, a moment after a play.
    fn schedule_unmute(&mut self, reset_volume: bool) {
        self.cancel_unmute();
        let token = CancellationToken::new();
        self.unmute = Some(token.clone());

        let widget = self.widget.clone();
        let delay = self.settings.unmute_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if widget.playback_state().await == Some(WidgetState::Playing) {
                        widget.unmute().await;
                        if reset_volume {
                            widget.set_volume(100).await;
                        }
                        debug!("Video started playing, unmuted");
                    }
                }
            }
        });
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "?"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{CommandEnvelope, PlayerStatus, StatusReceiver, COMMAND_KEY};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String),
        Play,
        Stop,
        Volume(u8),
        Unmute,
        Title(String),
        Overlay,
        ResetOverlay,
        Error(String),
    }

    struct FakeWidget {
        calls: Mutex<Vec<(Instant, Call)>>,
        state: Mutex<Option<WidgetState>>,
        volume: Mutex<Option<u8>>,
        overlay: bool,
    }

    impl FakeWidget {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                state: Mutex::new(None),
                volume: Mutex::new(Some(100)),
                overlay: true,
            })
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push((Instant::now(), call));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
        }

        fn timed_calls(&self) -> Vec<(Instant, Call)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoWidget for FakeWidget {
        async fn load(&self, video_id: &str) {
            self.record(Call::Load(video_id.to_string()));
        }
        async fn play(&self) {
            self.record(Call::Play);
            *self.state.lock().unwrap() = Some(WidgetState::Playing);
        }
        async fn stop(&self) {
            self.record(Call::Stop);
            *self.state.lock().unwrap() = Some(WidgetState::Unstarted);
        }
        async fn set_volume(&self, volume: u8) {
            self.record(Call::Volume(volume));
            *self.volume.lock().unwrap() = Some(volume);
        }
        async fn volume(&self) -> Option<u8> {
            *self.volume.lock().unwrap()
        }
        async fn unmute(&self) {
            self.record(Call::Unmute);
        }
        async fn playback_state(&self) -> Option<WidgetState> {
            *self.state.lock().unwrap()
        }
    }

    #[async_trait]
    impl PlayerChrome for FakeWidget {
        async fn set_title(&self, title: &str) {
            self.record(Call::Title(title.to_string()));
        }
        fn has_overlay(&self) -> bool {
            self.overlay
        }
        async fn start_overlay_fade(&self, _duration: Duration) {
            self.record(Call::Overlay);
        }
        async fn reset_overlay(&self) {
            self.record(Call::ResetOverlay);
        }
        async fn show_error(&self, message: &str) {
            self.record(Call::Error(message.to_string()));
        }
    }

    struct Harness {
        widget: Arc<FakeWidget>,
        events: mpsc::Sender<WidgetEvent>,
        store: SharedStore,
        statuses: StatusReceiver,
        link: PlayerLink,
        shutdown: CancellationToken,
        handle: JoinHandle<Result<(), PlayerError>>,
        state: watch::Receiver<PlayerState>,
        fade_done: mpsc::Sender<FadeFinished>,
    }

    fn start_player() -> Harness {
        start_player_with(FakeWidget::new())
    }

    fn start_player_with(widget: Arc<FakeWidget>) -> Harness {
        let store = SharedStore::new();
        let statuses = StatusReceiver::new(&store);
        let link = PlayerLink::new();
        let (events, rx) = mpsc::channel(16);
        let machine = PlayerMachine::new(
            widget.clone(),
            widget.clone(),
            rx,
            &store,
            link.clone(),
            PlayerSettings::default(),
        );
        let state = machine.subscribe_state();
        let fade_done = machine.fade_done_tx.clone();
        let shutdown = CancellationToken::new();
        let handle = machine.spawn(shutdown.clone());
        Harness {
            widget,
            events,
            store,
            statuses,
            link,
            shutdown,
            handle,
            state,
            fade_done,
        }
    }

    fn send_command(store: &SharedStore, command: Command) {
        let text = CommandEnvelope::new(command).encode().unwrap();
        store.replace_and_notify(COMMAND_KEY, text);
    }

    fn play(id: &str) -> Command {
        Command::Play {
            video_id: id.to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_fails_initialization() {
        let mut h = start_player();
        assert!(h.link.is_open());

        let result = h.handle.await.unwrap();
        assert_eq!(
            result,
            Err(PlayerError::InitializationTimeout(DEFAULT_INIT_TIMEOUT))
        );
        assert_eq!(*h.state.borrow_and_update(), PlayerState::Failed);
        assert!(h
            .widget
            .calls()
            .contains(&Call::Error(INIT_TIMEOUT_MESSAGE.to_string())));
        assert!(!h.link.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn ready_reports_and_runs_stored_command() {
        let mut h = start_player();
        send_command(&h.store, play("abc12345678"));
        settle().await;
        // Commands before ready are dropped.
        assert!(!h.widget.calls().contains(&Call::Load("abc12345678".to_string())));

        h.events.send(WidgetEvent::Ready).await.unwrap();
        let status = h.statuses.next().await.unwrap().unwrap();
        assert_eq!(status.status, PlayerStatus::Ready);
        settle().await;

        let calls = h.widget.calls();
        assert!(calls.contains(&Call::Load("abc12345678".to_string())));
        assert!(calls.contains(&Call::Title("Artist - Song".to_string())));

        tokio::time::sleep(DEFAULT_UNMUTE_DELAY).await;
        assert!(h.widget.calls().contains(&Call::Unmute));

        h.shutdown.cancel();
        assert_eq!(h.handle.await.unwrap(), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn ended_reports_current_id_once() {
        let mut h = start_player();
        h.events.send(WidgetEvent::Ready).await.unwrap();
        h.statuses.next().await.unwrap().unwrap();

        send_command(&h.store, play("abc12345678"));
        settle().await;
        h.events
            .send(WidgetEvent::StateChanged {
                state: WidgetState::Ended,
                video_id: None,
            })
            .await
            .unwrap();

        let status = h.statuses.next().await.unwrap().unwrap();
        assert_eq!(status.status, PlayerStatus::Ended);
        assert_eq!(status.id.as_deref(), Some("abc12345678"));

        h.shutdown.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn widget_error_reports_code_and_message() {
        let mut h = start_player();
        h.events.send(WidgetEvent::Ready).await.unwrap();
        h.statuses.next().await.unwrap().unwrap();
        send_command(&h.store, play("abc12345678"));
        settle().await;

        h.events.send(WidgetEvent::Error(150)).await.unwrap();
        let status = h.statuses.next().await.unwrap().unwrap();
        assert_eq!(status.status, PlayerStatus::Error);
        assert_eq!(status.id.as_deref(), Some("abc12345678"));
        assert_eq!(status.code, Some(150));
        assert_eq!(status.message.as_deref(), Some("Playback disallowed (embed)"));
        settle().await;
        assert_eq!(*h.state.borrow_and_update(), PlayerState::Errored);
        assert!(h
            .widget
            .calls()
            .contains(&Call::Error("Player Error: Playback disallowed (embed) (150)".to_string())));

        h.shutdown.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fade_completes_within_duration_plus_one_tick() {
        let mut h = start_player();
        h.events.send(WidgetEvent::Ready).await.unwrap();
        h.statuses.next().await.unwrap().unwrap();
        send_command(&h.store, play("abc12345678"));
        settle().await;

        let started = Instant::now();
        send_command(&h.store, Command::FadeOutAndBlack { fade_duration: 3000 });
        let status = h.statuses.next().await.unwrap().unwrap();
        let elapsed = started.elapsed();

        assert_eq!(status.status, PlayerStatus::FadeComplete);
        assert_eq!(status.id.as_deref(), Some("abc12345678"));
        assert!(elapsed <= Duration::from_millis(3000) + super::super::fade::FADE_TICK);

        let calls: Vec<_> = h
            .widget
            .timed_calls()
            .into_iter()
            .filter(|(at, _)| *at >= started)
            .map(|(_, c)| c)
            .collect();
        let stop_at = calls.iter().position(|c| *c == Call::Stop).unwrap();
        assert_eq!(calls[stop_at - 1], Call::Volume(0));
        assert_eq!(calls[stop_at + 1], Call::Volume(100));
        assert_eq!(calls[0], Call::Overlay);

        h.shutdown.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fade_without_overlay_completes_immediately() {
        let widget = Arc::new(FakeWidget {
            calls: Mutex::new(Vec::new()),
            state: Mutex::new(None),
            volume: Mutex::new(Some(100)),
            overlay: false,
        });
        let mut h = start_player_with(widget);
        h.events.send(WidgetEvent::Ready).await.unwrap();
        h.statuses.next().await.unwrap().unwrap();
        send_command(&h.store, play("abc12345678"));
        settle().await;

        let started = Instant::now();
        send_command(&h.store, Command::FadeOutAndBlack { fade_duration: 5000 });
        let status = h.statuses.next().await.unwrap().unwrap();
        assert_eq!(status.status, PlayerStatus::FadeComplete);
        assert_eq!(status.id.as_deref(), Some("abc12345678"));
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(!h.widget.calls().contains(&Call::Stop));

        h.shutdown.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_fade() {
        let mut h = start_player();
        h.events.send(WidgetEvent::Ready).await.unwrap();
        h.statuses.next().await.unwrap().unwrap();
        send_command(&h.store, play("abc12345678"));
        settle().await;

        send_command(&h.store, Command::FadeOutAndBlack { fade_duration: 1000 });
        tokio::time::sleep(Duration::from_millis(200)).await;
        send_command(&h.store, Command::Stop);
        settle().await;
        let stops_after_stop = h.widget.calls().iter().filter(|c| **c == Call::Stop).count();
        assert_eq!(stops_after_stop, 1);
        assert!(h.widget.calls().contains(&Call::Title(IDLE_TITLE.to_string())));

        // No fadeComplete ever arrives for the cancelled fade.
        let pending =
            tokio::time::timeout(Duration::from_millis(2000), h.statuses.next()).await;
        assert!(pending.is_err());
        assert_eq!(
            h.widget.calls().iter().filter(|c| **c == Call::Stop).count(),
            1
        );

        h.shutdown.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn late_fade_completion_does_not_stop_next_video() {
        let mut h = start_player();
        h.events.send(WidgetEvent::Ready).await.unwrap();
        h.statuses.next().await.unwrap().unwrap();
        send_command(&h.store, play("abc12345678"));
        settle().await;

        send_command(&h.store, Command::FadeOutAndBlack { fade_duration: 1000 });
        tokio::time::sleep(Duration::from_millis(200)).await;
        send_command(&h.store, play("xyz12345678"));
        settle().await;

        // The cancelled fade reports completion after the new video loaded.
        h.fade_done
            .send(FadeFinished { generation: 1 })
            .await
            .unwrap();
        settle().await;

        let calls = h.widget.calls();
        let loaded_at = calls
            .iter()
            .position(|c| *c == Call::Load("xyz12345678".to_string()))
            .unwrap();
        assert!(!calls[loaded_at..].contains(&Call::Stop));
        let pending =
            tokio::time::timeout(Duration::from_millis(2000), h.statuses.next()).await;
        assert!(pending.is_err());

        h.shutdown.cancel();
        h.handle.await.unwrap().unwrap();
    }
}
