use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Notification, WorkflowError};

/// The three lead-capture forms of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Resume,
    JobPost,
    Contact,
}

/// What the form does once the endpoint has accepted a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSubmit {
    /// Keep the thank-you panel until the user asks to submit another.
    AwaitDismiss,
    /// Clear back to an empty form after the reset delay.
    ResetAfterDelay,
}

const RESUME_REQUIRED: &[&str] = &[
    "fullName",
    "email",
    "phone",
    "location",
    "jobTitle",
    "experience",
    "skills",
];
const RESUME_OPTIONAL: &[&str] = &["linkedin", "portfolio", "message"];

const JOB_POST_REQUIRED: &[&str] = &[
    "companyName",
    "contactName",
    "email",
    "jobTitle",
    "jobType",
    "location",
    "experience",
    "description",
    "skills",
];
const JOB_POST_OPTIONAL: &[&str] = &["phone", "salary"];

const CONTACT_REQUIRED: &[&str] = &["name", "email", "message"];
const CONTACT_OPTIONAL: &[&str] = &["phone"];

impl FormKind {
    pub fn requires_upload(self) -> bool {
        matches!(self, FormKind::Resume)
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            FormKind::Resume => RESUME_REQUIRED,
            FormKind::JobPost => JOB_POST_REQUIRED,
            FormKind::Contact => CONTACT_REQUIRED,
        }
    }

    pub fn optional_fields(self) -> &'static [&'static str] {
        match self {
            FormKind::Resume => RESUME_OPTIONAL,
            FormKind::JobPost => JOB_POST_OPTIONAL,
            FormKind::Contact => CONTACT_OPTIONAL,
        }
    }

    /// Whether `name` is one of this form's fields; anything else is dropped.
    pub fn accepts_field(self, name: &str) -> bool {
        self.required_fields()
            .iter()
            .chain(self.optional_fields())
            .any(|field| *field == name)
    }

    pub fn after_submit(self) -> AfterSubmit {
        match self {
            FormKind::Resume => AfterSubmit::AwaitDismiss,
            FormKind::JobPost | FormKind::Contact => AfterSubmit::ResetAfterDelay,
        }
    }

    pub fn success_notification(self) -> Notification {
        match self {
            FormKind::Resume => Notification::info(
                "Resume submitted successfully",
                "We'll review your profile and get back to you soon.",
            ),
            FormKind::JobPost => Notification::info(
                "Job requirement submitted",
                "We'll get back to you within 24 hours.",
            ),
            FormKind::Contact => Notification::info(
                "Message sent successfully!",
                "We'll get back to you as soon as possible.",
            ),
        }
    }

    /// Required fields in declaration order, then per-field format rules.
    pub(crate) fn check_fields(self, data: &FormData) -> Result<(), WorkflowError> {
        if let Some(field) = self
            .required_fields()
            .iter()
            .find(|field| data.is_blank(field))
        {
            return Err(WorkflowError::MissingField {
                field: (*field).to_string(),
            });
        }

        if let Some(email) = data.get("email").map(str::trim) {
            if !email.is_empty() && !is_plausible_email(email) {
                return Err(invalid("email", "Please enter a valid email address."));
            }
        }

        if self == FormKind::Contact {
            if char_len(data.get("name")) < 2 {
                return Err(invalid("name", "Name must be at least 2 characters."));
            }
            if char_len(data.get("message")) < 10 {
                return Err(invalid(
                    "message",
                    "Message must be at least 10 characters.",
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormKind::Resume => write!(f, "resume"),
            FormKind::JobPost => write!(f, "job-post"),
            FormKind::Contact => write!(f, "contact"),
        }
    }
}

impl FromStr for FormKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resume" => Ok(FormKind::Resume),
            "job-post" | "job_post" | "jobpost" => Ok(FormKind::JobPost),
            "contact" => Ok(FormKind::Contact),
            other => Err(format!("unknown form kind {other:?}")),
        }
    }
}

fn invalid(field: &str, reason: &str) -> WorkflowError {
    WorkflowError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn char_len(value: Option<&str>) -> usize {
    value.map(|v| v.trim().chars().count()).unwrap_or(0)
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}

/// Text-field values keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, String>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_blank(&self, name: &str) -> bool {
        self.get(name).map_or(true, |v| v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str, message: &str) -> FormData {
        [("name", name), ("email", email), ("message", message)]
            .into_iter()
            .collect()
    }

    #[test]
    fn only_declared_fields_are_accepted() {
        assert!(FormKind::Resume.accepts_field("fullName"));
        assert!(FormKind::Resume.accepts_field("linkedin"));
        assert!(!FormKind::Resume.accepts_field("companyName"));
        assert!(FormKind::JobPost.accepts_field("salary"));
        assert!(!FormKind::Contact.accepts_field("Name"));
    }

    #[test]
    fn first_blank_required_field_is_reported() {
        let data: FormData = [("fullName", "Ada"), ("email", "   ")].into_iter().collect();
        assert_eq!(
            FormKind::Resume.check_fields(&data),
            Err(WorkflowError::MissingField {
                field: "email".to_string(),
            })
        );
    }

    #[test]
    fn contact_enforces_minimum_lengths() {
        assert!(matches!(
            FormKind::Contact.check_fields(&contact("A", "a@b.co", "long enough text")),
            Err(WorkflowError::InvalidField { field, .. }) if field == "name"
        ));
        assert!(matches!(
            FormKind::Contact.check_fields(&contact("Ada", "a@b.co", "short")),
            Err(WorkflowError::InvalidField { field, .. }) if field == "message"
        ));
        assert_eq!(
            FormKind::Contact.check_fields(&contact("Ada", "a@b.co", "Hello there team")),
            Ok(())
        );
    }

    #[test]
    fn email_plausibility() {
        for ok in ["a@b.co", "first.last@mail.example.com"] {
            assert!(is_plausible_email(ok), "{ok}");
        }
        for bad in ["ab.co", "@b.co", "a@b", "a@.co", "a@b.", "a b@c.de", "a@b@c.de"] {
            assert!(!is_plausible_email(bad), "{bad}");
        }
    }

    #[test]
    fn kind_parses_from_cli_spelling() {
        assert_eq!("job-post".parse(), Ok(FormKind::JobPost));
        assert_eq!("Resume".parse(), Ok(FormKind::Resume));
        assert!("newsletter".parse::<FormKind>().is_err());
        assert_eq!(FormKind::JobPost.to_string(), "job-post");
    }

    #[test]
    fn form_data_serializes_as_flat_map() {
        let data: FormData = [("email", "a@b.co"), ("name", "Ada")].into_iter().collect();
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"email":"a@b.co","name":"Ada"}"#);
    }
}
