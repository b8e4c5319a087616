pub mod coalescer;
pub mod recorder;

pub use coalescer::{coalesce, ActionChange, ActionCoalescer, Coalesced};
pub use recorder::SessionRecorder;
