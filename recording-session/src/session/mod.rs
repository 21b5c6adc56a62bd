mod dispatcher;
pub mod recording;
mod ticker;
