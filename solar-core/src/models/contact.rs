use serde::{Deserialize, Serialize};

use crate::validation::{FieldErrors, ValidationErrors, is_loose_email};

/// Message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Rules:
    /// - name: required, 2+ characters
    /// - email: required, `user@host`
    /// - subject: required, 5+ characters
    /// - message: required, 10+ characters
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();

        errors.require_text("name", &self.name, 2);
        if self.email.trim().is_empty() {
            errors.push("email", "is required");
        } else if !is_loose_email(&self.email) {
            errors.push("email", "is not a valid address");
        }
        errors.require_text("subject", &self.subject, 5);
        errors.require_text("message", &self.message, 10);

        errors.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewsletterSubscription {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Generic `{success, message}` reply of the write-only endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_message() -> ContactMessage {
        ContactMessage {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            subject: "Consulta sobre el proyecto".to_string(),
            message: "Quisiera saber más sobre la inversión mínima.".to_string(),
        }
    }

    #[test]
    fn valid_contact_message_passes() {
        assert!(valid_message().validate().is_ok());
    }

    #[test]
    fn short_fields_are_reported_together() {
        let message = ContactMessage {
            name: "A".to_string(),
            email: "not-an-address".to_string(),
            subject: "Hey".to_string(),
            message: "Short".to_string(),
            ..valid_message()
        };

        let err = message.validate().unwrap_err();

        assert_eq!(err.errors().len(), 4);
        assert_eq!(err.message_for("email"), Some("is not a valid address"));
    }

    #[test]
    fn acknowledgement_defaults_to_success() {
        let ack: Acknowledgement = serde_json::from_str("{}").unwrap();
        assert!(ack.success);
        assert_eq!(ack.message, None);
    }
}
