//! # Events Module
//!
//! Progress reporting over channels, so any front end (CLI, GUI) can follow a scan.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Analyze(AnalyzeEvent::Progress(p)) = event {
//!             println!("{}: {}/{}", p.kind, p.completed, p.total);
//!         }
//!     }
//! });
//!
//! let ctx = ScanContext::new(sender, CancellationToken::new());
//! engine.scan_folder_with(&root, 10, &ctx)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
