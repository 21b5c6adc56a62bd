pub mod audio_route;
pub mod capture_backend;
pub mod session_listener;
