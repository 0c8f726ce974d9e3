//! Now-playing poller
//!
//! Asks the backend what is playing on Spotify on every tick and logs each
//! track once per local calendar day.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::api::{ApiClient, SessionStore};
use crate::error::{ApiError, Result};
use crate::resources::{MusicApi, NewTrack, PlayingItem, SpotifyApi, Track};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
pub const DEFAULT_MOOD: &str = "listening";

/// Where the currently playing item comes from
#[async_trait]
pub trait NowPlayingSource: Send + Sync {
    async fn now_playing(&self) -> Result<Option<PlayingItem>>;
}

/// Where listened tracks are recorded
#[async_trait]
pub trait TrackSink: Send + Sync {
    /// Tracks already logged, used to skip duplicates
    async fn known_tracks(&self) -> Result<Vec<Track>>;

    async fn log_track(&self, track: &NewTrack) -> Result<Track>;
}

/// Paces the polling loop
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// [`Ticker`] over a tokio interval; the first tick fires immediately
pub struct IntervalTicker {
    interval: tokio::time::Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Source and sink over the REST API
///
/// `spotify` carries the Spotify access token, `music` the user's session.
#[derive(Clone)]
pub struct RemotePlayback {
    spotify: ApiClient,
    music: ApiClient,
}

impl RemotePlayback {
    pub fn new(spotify: ApiClient, music: ApiClient) -> Self {
        Self { spotify, music }
    }
}

#[async_trait]
impl NowPlayingSource for RemotePlayback {
    async fn now_playing(&self) -> Result<Option<PlayingItem>> {
        SpotifyApi::new(&self.spotify).now_playing().await
    }
}

#[async_trait]
impl TrackSink for RemotePlayback {
    async fn known_tracks(&self) -> Result<Vec<Track>> {
        MusicApi::new(&self.music).list().await
    }

    async fn log_track(&self, track: &NewTrack) -> Result<Track> {
        MusicApi::new(&self.music).upsert_track(track).await
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    NothingPlaying,
    AlreadyLogged(PlayingItem),
    Logged(Track),
}

/// Why [`NowPlayingPoller::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// The Spotify token was rejected; the caller should forget it
    Unauthorized,
    /// The shutdown future resolved
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ListenKey {
    track_name: String,
    artist: String,
    day: NaiveDate,
}

/// Polling loop with per-day deduplication
pub struct NowPlayingPoller<T: Ticker> {
    source: std::sync::Arc<dyn NowPlayingSource>,
    sink: std::sync::Arc<dyn TrackSink>,
    ticker: T,
    logged: Vec<ListenKey>,
    current: watch::Sender<Option<PlayingItem>>,
}

impl<T: Ticker> NowPlayingPoller<T> {
    pub fn new(
        source: std::sync::Arc<dyn NowPlayingSource>,
        sink: std::sync::Arc<dyn TrackSink>,
        ticker: T,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            source,
            sink,
            ticker,
            logged: Vec::new(),
            current,
        }
    }

    /// Follow the currently playing item
    pub fn subscribe(&self) -> watch::Receiver<Option<PlayingItem>> {
        self.current.subscribe()
    }

    /// Reload the list of already logged tracks from the sink
    pub async fn refresh_known(&mut self) -> Result<()> {
        let tracks = self.sink.known_tracks().await?;
        self.logged = tracks
            .iter()
            .filter_map(|t| {
                Some(ListenKey {
                    track_name: t.track_name.clone(),
                    artist: t.artist.clone(),
                    day: t.listened_on()?,
                })
            })
            .collect();
        tracing::debug!("Loaded {} logged listens", self.logged.len());
        Ok(())
    }

    /// Ask once what is playing and log it if it is new today
    pub async fn poll_once(&mut self) -> Result<PollResult> {
        let item = self.source.now_playing().await?;
        self.current.send_replace(item.clone());

        let Some(item) = item else {
            return Ok(PollResult::NothingPlaying);
        };

        let today = Local::now().date_naive();
        self.logged.retain(|k| k.day == today);

        let key = ListenKey {
            track_name: item.name.clone(),
            artist: item.first_artist().unwrap_or(UNKNOWN_ARTIST).to_string(),
            day: today,
        };
        if self.logged.contains(&key) {
            tracing::debug!("\"{}\" already logged today", key.track_name);
            return Ok(PollResult::AlreadyLogged(item));
        }

        let track = NewTrack {
            track_name: key.track_name.clone(),
            artist: key.artist.clone(),
            album: item.album_name().unwrap_or(UNKNOWN_ALBUM).to_string(),
            mood: DEFAULT_MOOD.to_string(),
            genre: String::new(),
            duration_minutes: item.duration_minutes(),
            listened_at: Utc::now(),
        };
        let logged = self.sink.log_track(&track).await?;
        tracing::info!("Logged \"{}\" by {}", track.track_name, track.artist);
        self.logged.push(key);
        Ok(PollResult::Logged(logged))
    }

    /// Poll on every tick until `shutdown` resolves or the token is rejected
    ///
    /// Other errors are logged and polling carries on.
    pub async fn run<F>(&mut self, shutdown: F) -> PollExit
    where
        F: Future<Output = ()> + Send,
    {
        if let Err(e) = self.refresh_known().await {
            tracing::warn!("Could not load logged tracks: {}", e);
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => return PollExit::Stopped,
                _ = self.ticker.tick() => {}
            }

            match self.poll_once().await {
                Ok(result) => tracing::trace!("Poll result: {:?}", result),
                Err(ApiError::Unauthorized) => {
                    tracing::warn!("Spotify token rejected, stopping");
                    self.current.send_replace(None);
                    return PollExit::Unauthorized;
                }
                Err(e) => tracing::warn!("Error fetching now playing: {}", e),
            }
        }
    }

    /// [`run`](Self::run), then drop the stored Spotify token if it was rejected
    pub async fn run_with_session<F>(&mut self, session: &SessionStore, shutdown: F) -> Result<PollExit>
    where
        F: Future<Output = ()> + Send,
    {
        let exit = self.run(shutdown).await;
        if exit == PollExit::Unauthorized {
            session.set_spotify_token(None)?;
        }
        Ok(exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::spotify::{SpotifyAlbum, SpotifyArtist};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replies in order, then repeats the last one
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Option<PlayingItem>>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<Option<PlayingItem>>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl NowPlayingSource for ScriptedSource {
        async fn now_playing(&self) -> Result<Option<PlayingItem>> {
            *self.calls.lock() += 1;
            let mut replies = self.replies.lock();
            match replies.pop_front() {
                Some(reply) => reply,
                None => Ok(None),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        known: Vec<Track>,
        logged: Mutex<Vec<NewTrack>>,
    }

    #[async_trait]
    impl TrackSink for RecordingSink {
        async fn known_tracks(&self) -> Result<Vec<Track>> {
            Ok(self.known.clone())
        }

        async fn log_track(&self, track: &NewTrack) -> Result<Track> {
            self.logged.lock().push(track.clone());
            Ok(Track {
                id: self.logged.lock().len().to_string(),
                track_name: track.track_name.clone(),
                artist: track.artist.clone(),
                album: Some(track.album.clone()),
                mood: Some(track.mood.clone()),
                genre: None,
                duration_minutes: Some(track.duration_minutes),
                listened_at: Some(track.listened_at.to_rfc3339()),
            })
        }
    }

    /// Ticks immediately
    struct InstantTicker;

    #[async_trait]
    impl Ticker for InstantTicker {
        async fn tick(&mut self) {
            tokio::task::yield_now().await;
        }
    }

    fn item(name: &str, artist: Option<&str>) -> PlayingItem {
        PlayingItem {
            name: name.into(),
            artists: artist
                .map(|a| vec![SpotifyArtist { name: a.into() }])
                .unwrap_or_default(),
            album: None,
            duration_ms: Some(200_000),
        }
    }

    #[tokio::test]
    async fn test_logs_new_track_with_defaults() {
        let source = ScriptedSource::new(vec![Ok(Some(item("Song", None)))]);
        let sink = Arc::new(RecordingSink::default());
        let mut poller = NowPlayingPoller::new(source, sink.clone(), InstantTicker);
        let current = poller.subscribe();

        let result = poller.poll_once().await.unwrap();

        assert!(matches!(result, PollResult::Logged(_)));
        let logged = sink.logged.lock();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].artist, UNKNOWN_ARTIST);
        assert_eq!(logged[0].album, UNKNOWN_ALBUM);
        assert_eq!(logged[0].mood, DEFAULT_MOOD);
        assert_eq!(logged[0].duration_minutes, 3);
        assert_eq!(current.borrow().as_ref().map(|i| i.name.as_str()), Some("Song"));
    }

    #[tokio::test]
    async fn test_same_track_today_is_not_logged_twice() {
        let mut playing = item("Song", Some("Band"));
        playing.album = Some(SpotifyAlbum { name: "Record".into() });
        let source = ScriptedSource::new(vec![
            Ok(Some(playing.clone())),
            Ok(Some(playing.clone())),
            Ok(Some(item("Song", Some("Other Band")))),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let mut poller = NowPlayingPoller::new(source, sink.clone(), InstantTicker);

        assert!(matches!(poller.poll_once().await.unwrap(), PollResult::Logged(_)));
        assert_eq!(poller.poll_once().await.unwrap(), PollResult::AlreadyLogged(playing));
        assert!(matches!(poller.poll_once().await.unwrap(), PollResult::Logged(_)));

        let logged = sink.logged.lock();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].album, "Record");
    }

    #[tokio::test]
    async fn test_known_tracks_from_today_are_skipped() {
        let today = Local::now();
        let sink = Arc::new(RecordingSink {
            known: vec![
                Track {
                    id: "1".into(),
                    track_name: "Song".into(),
                    artist: "Band".into(),
                    album: None,
                    mood: None,
                    genre: None,
                    duration_minutes: None,
                    listened_at: Some(today.to_rfc3339()),
                },
                Track {
                    id: "2".into(),
                    track_name: "Old".into(),
                    artist: "Band".into(),
                    album: None,
                    mood: None,
                    genre: None,
                    duration_minutes: None,
                    listened_at: Some("2001-01-01".into()),
                },
            ],
            logged: Mutex::new(Vec::new()),
        });
        let source = ScriptedSource::new(vec![
            Ok(Some(item("Song", Some("Band")))),
            Ok(Some(item("Old", Some("Band")))),
        ]);
        let mut poller = NowPlayingPoller::new(source, sink.clone(), InstantTicker);
        poller.refresh_known().await.unwrap();

        assert!(matches!(poller.poll_once().await.unwrap(), PollResult::AlreadyLogged(_)));
        assert!(matches!(poller.poll_once().await.unwrap(), PollResult::Logged(_)));
        assert_eq!(sink.logged.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_unauthorized() {
        let source = ScriptedSource::new(vec![
            Ok(Some(item("Song", Some("Band")))),
            Err(ApiError::Status {
                status: 502,
                message: "Bad gateway".into(),
            }),
            Ok(None),
            Err(ApiError::Unauthorized),
        ]);
        let sink = Arc::new(RecordingSink::default());
        let mut poller = NowPlayingPoller::new(source.clone(), sink.clone(), InstantTicker);
        let current = poller.subscribe();

        let exit = tokio::time::timeout(Duration::from_secs(1), poller.run(std::future::pending()))
            .await
            .expect("poller should stop by itself");

        assert_eq!(exit, PollExit::Unauthorized);
        assert_eq!(*source.calls.lock(), 4);
        assert_eq!(sink.logged.lock().len(), 1);
        assert!(current.borrow().is_none());
    }

    #[tokio::test]
    async fn test_rejected_token_is_cleared_from_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_spotify_token(Some("spot".into())).unwrap();

        let source = ScriptedSource::new(vec![Err(ApiError::Unauthorized)]);
        let sink = Arc::new(RecordingSink::default());
        let mut poller = NowPlayingPoller::new(source, sink, InstantTicker);

        let exit = poller
            .run_with_session(&session, std::future::pending())
            .await
            .unwrap();

        assert_eq!(exit, PollExit::Unauthorized);
        assert!(session.spotify_token().is_none());
        let reopened = SessionStore::open(dir.path().join("session.json")).unwrap();
        assert!(reopened.spotify_token().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_keeps_session_token() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_spotify_token(Some("spot".into())).unwrap();

        let source = ScriptedSource::new(Vec::new());
        let sink = Arc::new(RecordingSink::default());
        let mut poller = NowPlayingPoller::new(
            source,
            sink,
            IntervalTicker::new(Duration::from_secs(3600)),
        );

        let exit = poller
            .run_with_session(&session, tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();

        assert_eq!(exit, PollExit::Stopped);
        assert_eq!(session.spotify_token(), Some("spot".to_string()));
    }

    #[tokio::test]
    async fn test_listens_from_earlier_days_are_forgotten() {
        let sink = Arc::new(RecordingSink {
            known: vec![Track {
                id: "1".into(),
                track_name: "Old".into(),
                artist: "Band".into(),
                album: None,
                mood: None,
                genre: None,
                duration_minutes: None,
                listened_at: Some("2001-01-01".into()),
            }],
            logged: Mutex::new(Vec::new()),
        });
        let source = ScriptedSource::new(vec![Ok(Some(item("Song", Some("Band"))))]);
        let mut poller = NowPlayingPoller::new(source, sink, InstantTicker);
        poller.refresh_known().await.unwrap();
        assert_eq!(poller.logged.len(), 1);

        poller.poll_once().await.unwrap();

        let today = Local::now().date_naive();
        assert_eq!(poller.logged.len(), 1);
        assert!(poller.logged.iter().all(|k| k.day == today));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let source = ScriptedSource::new(Vec::new());
        let sink = Arc::new(RecordingSink::default());
        let mut poller = NowPlayingPoller::new(
            source,
            sink,
            IntervalTicker::new(Duration::from_secs(3600)),
        );

        let exit = poller
            .run(tokio::time::sleep(Duration::from_millis(20)))
            .await;
        assert_eq!(exit, PollExit::Stopped);
    }
}
