//! Log-only [`Mailer`].
//!
//! Outbound delivery is outside this service; messages are written to the
//! trace log so an operator or relay can pick them up.

use std::convert::Infallible;

use barrier_core::notify::{Email, Mailer};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
  type Error = Infallible;

  async fn send(&self, email: &Email) -> Result<(), Infallible> {
    tracing::info!(
      subject = %email.subject,
      to = ?email.to,
      bcc = ?email.bcc,
      attachments = email.attachments.len(),
      "outbound e-mail"
    );
    Ok(())
  }
}
