//! This module holds typed parameters for various endpoint inputs.
//!
//! Form bodies posted by producers are deserialized into these structs before
//! the handlers look at them. Fields default to empty so that a missing field
//! is reported by the handler with a plain-text message instead of an
//! extractor rejection.

pub(crate) mod notification;
