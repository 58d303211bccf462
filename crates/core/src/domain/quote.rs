use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Postcode,
    Contact,
    Details,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [Self::Name, Self::Postcode, Self::Contact, Self::Details];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Postcode => "Postcode",
            Self::Contact => "Contact",
            Self::Details => "Details",
        }
    }
}

/// The four customer-entered fields of a quote request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub name: String,
    pub postcode: String,
    /// Email address or phone number.
    pub contact: String,
    pub details: String,
}

impl QuoteRequest {
    pub fn new(
        name: impl Into<String>,
        postcode: impl Into<String>,
        contact: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            postcode: postcode.into(),
            contact: contact.into(),
            details: details.into(),
        }
    }

    pub fn field(&self, field: RequiredField) -> &str {
        match field {
            RequiredField::Name => &self.name,
            RequiredField::Postcode => &self.postcode,
            RequiredField::Contact => &self.contact,
            RequiredField::Details => &self.details,
        }
    }

    pub fn missing_fields(&self) -> Vec<RequiredField> {
        RequiredField::ALL
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        Err(ValidationError::MissingFields { fields: missing })
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.name.trim(),
            self.postcode.trim(),
            self.contact.trim(),
            self.details.trim(),
        )
    }

    pub fn subject(&self) -> String {
        format!("New Waste Removal Quote Request - {} ({})", self.name, self.postcode)
    }
}
