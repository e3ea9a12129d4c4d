//! Confirmation email composition and dispatch.
//!
//! Once a booking event has been correlated with a quote, this crate builds
//! the Japanese confirmation message and sends it to the customer and the
//! staff inbox independently, with bounded retry. The outbound transport is
//! behind the [`email::EmailSender`] trait so it can be mocked in tests.

pub mod compose;
pub mod email;
pub mod sender;

pub use compose::{admin_confirmation, customer_confirmation, format_yen, ConfirmationEmail};
pub use email::{EmailConfig, EmailError, EmailSender, NullSender, SmtpSender};
pub use sender::{NotificationOutcome, NotificationReport, NotificationSender, SendStatus};
