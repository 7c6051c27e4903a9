//! Core systems for Strata.
//!
//! This crate provides the reactive plumbing shared by the Strata
//! collections:
//!
//! - **Signal/Slot System**: Type-safe change notification, including
//!   cancelable pre-change signals
//! - **Property System**: Observable values with change detection
//! - **Logging**: `tracing` targets, performance spans and tree dumps
//!
//! # Signal/Slot Example
//!
//! ```
//! use strata_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use strata_core::{Property, Signal};
//!
//! struct Counter {
//!     value: Property<i32>,
//!     value_changed: Signal<i32>,
//! }
//!
//! impl Counter {
//!     fn increment(&self) {
//!         let new_value = self.value.get() + 1;
//!         if self.value.set(new_value) {
//!             self.value_changed.emit(new_value);
//!         }
//!     }
//! }
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::{PerfSpan, TreeDebug, TreeFormatOptions, TreeFormatter, TreeStyle};
pub use property::Property;
pub use signal::{CancelableSignal, ConnectionGuard, ConnectionId, Signal};
