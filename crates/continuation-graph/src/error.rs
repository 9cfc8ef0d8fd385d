use std::fmt;

use gtfs::FeedError;

/// A fatal condition that aborts the conversion before any output is
/// written. Printed without a backtrace; never recovered from mid-pipeline.
#[derive(Debug)]
pub enum ConvertError {
    Feed(FeedError),
    Config(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed(err) => write!(f, "{err}"),
            Self::Config(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<FeedError> for ConvertError {
    fn from(err: FeedError) -> Self {
        Self::Feed(err)
    }
}
