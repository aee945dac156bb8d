//! Protocol definitions for the tagged-property transport.
//!
//! This module contains the generic property model (identifier catalog and
//! tagged value union) and the raw event stream vocabulary.

pub mod event;
pub mod property;

pub use event::RawEvent;
pub use property::{Property, PropertyId, PropertyValue, ValueTag};
