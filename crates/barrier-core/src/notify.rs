//! Notification e-mails and the mailer interface that delivers them.
//!
//! Messages are built here as plain values. Delivery is best-effort: a
//! [`Mailer`] failure is logged by the caller and never undoes the write that
//! triggered it.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{case_file::CaseFile, lookup::Outcome};

// ─── Config ──────────────────────────────────────────────────────────────────

/// Fixed addresses used on every outgoing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
  pub from_address:    String,
  /// Reply-to address for every notice.
  pub program_mailbox: String,
  /// Internal distribution list, blind-copied on every notice.
  pub distribution:    Vec<String>,
}

impl Default for NoticeConfig {
  fn default() -> Self {
    Self {
      from_address:    "CBRAdeterminations@fws.gov".into(),
      program_mailbox: "CBRAdeterminations@fws.gov".into(),
      distribution:    vec!["CBRA@fws.gov".into()],
    }
  }
}

// ─── Email ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub name: String,
  /// Storage-relative path of the file to attach.
  pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
  pub subject:     String,
  pub body:        String,
  pub from:        String,
  pub to:          Vec<String>,
  pub bcc:         Vec<String>,
  pub reply_to:    Vec<String>,
  pub attachments: Vec<Attachment>,
}

impl Email {
  fn addressed(config: &NoticeConfig, to: &str, subject: String, body: String) -> Self {
    Self {
      subject,
      body,
      from: config.from_address.clone(),
      to: vec![to.to_owned()],
      bcc: config.distribution.clone(),
      reply_to: vec![config.program_mailbox.clone()],
      attachments: Vec::new(),
    }
  }
}

const GREETING: &str = "Dear Requester,\r\n\r\n";

/// Sent to the requester once a new case has its reference code.
pub fn confirmation(config: &NoticeConfig, reference: &str, to: &str) -> Email {
  let subject = "Coastal Barrier Resources Act Determination Request Received".to_owned();
  let body = format!(
    "{GREETING}The U.S. Fish and Wildlife Service has received your request.\r\nThe \
     Reference Number is: {reference}"
  );
  Email::addressed(config, to, subject, body)
}

/// Legal-effect paragraph for a determination outcome.
pub fn outcome_text(outcome: Option<Outcome>) -> &'static str {
  match outcome {
    Some(Outcome::In) => {
      "The property is located within a unit of the Coastal Barrier Resources System. \
       Most new Federal expenditures and financial assistance, including Federal flood \
       insurance, are prohibited for the property."
    }
    Some(Outcome::Out) => {
      "The property is located outside the Coastal Barrier Resources System. The \
       Coastal Barrier Resources Act does not restrict Federal expenditures or \
       financial assistance for the property."
    }
    Some(Outcome::PartiallyInStructureIn) => {
      "The property is partially within a unit of the Coastal Barrier Resources \
       System and the structure on it is within the unit. Most new Federal \
       expenditures and financial assistance, including Federal flood insurance, are \
       prohibited for the structure."
    }
    Some(Outcome::PartiallyInStructureOut) => {
      "The property is partially within a unit of the Coastal Barrier Resources \
       System and the structure on it is outside the unit. The Coastal Barrier \
       Resources Act does not restrict Federal financial assistance for the \
       structure, but it does restrict assistance for any new construction within \
       the unit."
    }
    Some(Outcome::PartiallyInNoStructure) => {
      "The property is partially within a unit of the Coastal Barrier Resources \
       System and has no structure on it. Whether Federal financial assistance is \
       available for future construction depends on where on the property it is \
       built."
    }
    None => {
      "A determination has not yet been made for this property. The Service will \
       contact you when the review is complete."
    }
  }
}

/// Sent to the requester when the final letter goes out, with the final
/// letter attached when one is on file.
pub fn determination(
  config: &NoticeConfig,
  reference: &str,
  to: &str,
  outcome: Option<Outcome>,
  final_letter: Option<&CaseFile>,
) -> Email {
  let subject = format!("Coastal Barrier Resources Act Determination Case {reference}");
  let body = format!(
    "{GREETING}Attached is the Coastal Barrier Resources Act determination that you \
     requested from the U.S. Fish and Wildlife Service.\r\n\r\n{}\r\n\r\nIf you have \
     any questions about this determination, please e-mail us at {}.",
    outcome_text(outcome),
    config.program_mailbox,
  );
  let mut email = Email::addressed(config, to, subject, body);
  email.attachments = final_letter
    .map(|f| Attachment { name: f.data.name.clone(), path: f.data.path.clone() })
    .into_iter()
    .collect();
  email
}

// ─── Mailer ──────────────────────────────────────────────────────────────────

/// Outbound e-mail delivery.
pub trait Mailer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    email: &'a Email,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{audit::AuditInfo, case_file::NewCaseFile};

  #[test]
  fn confirmation_embeds_reference_and_routing() {
    let email = confirmation(&NoticeConfig::default(), "3900F86C", "req@example.com");
    assert!(email.body.contains("The Reference Number is: 3900F86C"));
    assert_eq!(email.to, vec!["req@example.com"]);
    assert_eq!(email.bcc, vec!["CBRA@fws.gov"]);
    assert_eq!(email.reply_to, vec!["CBRAdeterminations@fws.gov"]);
    assert!(email.attachments.is_empty());
  }

  #[test]
  fn determination_text_follows_outcome() {
    let config = NoticeConfig::default();
    let inside = determination(&config, "X", "r@e.com", Some(Outcome::In), None);
    let pending = determination(&config, "X", "r@e.com", None, None);

    assert_eq!(inside.subject, "Coastal Barrier Resources Act Determination Case X");
    assert!(inside.body.contains(outcome_text(Some(Outcome::In))));
    assert!(pending.body.contains("has not yet been made"));
  }

  #[test]
  fn outcome_texts_are_distinct() {
    let texts = [
      outcome_text(Some(Outcome::In)),
      outcome_text(Some(Outcome::Out)),
      outcome_text(Some(Outcome::PartiallyInStructureIn)),
      outcome_text(Some(Outcome::PartiallyInStructureOut)),
      outcome_text(Some(Outcome::PartiallyInNoStructure)),
      outcome_text(None),
    ];
    for (i, a) in texts.iter().enumerate() {
      for b in &texts[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }

  #[test]
  fn determination_attaches_final_letter() {
    let now = Utc::now();
    let letter = CaseFile {
      id:          3,
      data:        NewCaseFile {
        case:           1,
        name:           "letter.pdf".into(),
        path:           "casefiles/1/letter.pdf".into(),
        from_requester: false,
        final_letter:   true,
        uploader:       None,
      },
      uploaded_at: now,
      audit:       AuditInfo::created(now, None),
    };
    let email = determination(&NoticeConfig::default(), "X", "r@e.com", None, Some(&letter));
    assert_eq!(email.attachments, vec![Attachment {
      name: "letter.pdf".into(),
      path: "casefiles/1/letter.pdf".into(),
    }]);
  }
}
