pub mod audio_io;
pub mod live_transport;
pub mod text_generator;
