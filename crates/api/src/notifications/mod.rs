//! Outbound notifications.
//!
//! - [`email`] -- signature confirmation emails over SMTP.

pub mod email;
