//! Spotify listening tracker

mod poller;

pub use poller::{
    IntervalTicker, NowPlayingPoller, NowPlayingSource, PollExit, PollResult, RemotePlayback,
    Ticker, TrackSink, DEFAULT_MOOD, UNKNOWN_ALBUM, UNKNOWN_ARTIST,
};
