//! Journey script generation from a coalesced action list.

pub mod formatter;
pub mod generator;
pub mod signals;
pub mod templates;

pub use formatter::LineFormatter;
pub use generator::{CodeGenerator, GeneratorOptions};
pub use signals::SignalSet;
