pub mod frame_queue;
pub mod live_session;
pub mod pcm;
pub mod playback;
pub mod relay;
pub mod transcript;

pub use live_session::{LiveSession, LiveSessionSettings, SessionState, SessionUpdate};
