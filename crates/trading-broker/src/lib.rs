//! Order sinks.

mod paper;

pub use paper::PaperBroker;
