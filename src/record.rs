//! Movement records handed to the inventory endpoint
//!
//! A decoded payload becomes the `code` of a [`MovementRecord`]. Transport is
//! the caller's job; this module only builds the form body, parses the
//! response envelope and persists the user's form defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Version reported in every submitted record
pub const CLIENT_VERSION: &str = "1.5.0";

/// Storage key for [`FormDefaults`]
pub const STORAGE_KEY: &str = "inventaire_defaults_v1";

/// Category that enables the free-text `category_other` field
pub const OTHER_CATEGORY: &str = "Autre";

/// One furniture/equipment movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Scanned code
    pub code: String,
    /// Location the item leaves
    pub origin: String,
    /// Location the item arrives at
    pub destination: String,
    /// Furniture category
    pub category: String,
    /// Free-text category, only when `category` is [`OTHER_CATEGORY`]
    pub category_other: Option<String>,
    /// Day of the movement
    pub movement_date: NaiveDate,
    /// Submitting client version
    pub client_version: String,
}

impl MovementRecord {
    /// Trim and validate the required fields
    pub fn new(
        code: &str,
        origin: &str,
        destination: &str,
        category: &str,
        movement_date: NaiveDate,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            code: required("code", code)?,
            origin: required("origin", origin)?,
            destination: required("destination", destination)?,
            category: required("category", category)?,
            category_other: None,
            movement_date,
            client_version: CLIENT_VERSION.to_string(),
        })
    }

    /// Attach the free-text category; ignored unless the category is "Autre"
    pub fn with_category_other(mut self, other: &str) -> Self {
        let other = other.trim();
        self.category_other =
            (self.category == OTHER_CATEGORY && !other.is_empty()).then(|| other.to_string());
        self
    }

    /// Ordered `application/x-www-form-urlencoded` pairs for the create call
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("action", "create".to_string()),
            ("code_scanné", self.code.clone()),
            ("emplacement_depart", self.origin.clone()),
            ("emplacement_destination", self.destination.clone()),
            ("type_mobilier", self.category.clone()),
            (
                "type_mobilier_autre",
                self.category_other.clone().unwrap_or_default(),
            ),
            ("date_mouvement", self.movement_date.format("%Y-%m-%d").to_string()),
            ("source_app_version", self.client_version.clone()),
        ]
    }

    /// Form defaults to remember after a successful submission
    pub fn defaults(&self) -> FormDefaults {
        FormDefaults {
            from: self.origin.clone(),
            to: self.destination.clone(),
            category: self.category.clone(),
        }
    }
}

fn required(name: &'static str, value: &str) -> Result<String, RecordError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RecordError::MissingField(name));
    }
    Ok(value.to_string())
}

/// Response envelope returned by the endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP-like status carried in the body
    #[serde(default)]
    pub status: u16,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Route-specific payload
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    /// Parse a JSON body
    pub fn from_json(body: &str) -> Result<Self, RecordError> {
        serde_json::from_str(body).map_err(|e| RecordError::MalformedResponse(e.to_string()))
    }

    /// Status in 200..300
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Payload on success, [`RecordError::Api`] otherwise
    pub fn into_result(self) -> Result<Option<serde_json::Value>, RecordError> {
        if self.is_success() {
            return Ok(self.data);
        }
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Inconnue".to_string());
        Err(RecordError::Api {
            status: self.status,
            message,
        })
    }
}

/// Origin, destination and category remembered between submissions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormDefaults {
    /// Last origin
    #[serde(default)]
    pub from: String,
    /// Last destination
    #[serde(default)]
    pub to: String,
    /// Last category
    #[serde(default, rename = "type")]
    pub category: String,
}

impl FormDefaults {
    /// Serialize for storage under [`STORAGE_KEY`]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Read stored defaults; unreadable data yields `None`
    pub fn from_json(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(defaults) => Some(defaults),
            Err(e) => {
                log::debug!("discarding stored form defaults: {e}");
                None
            }
        }
    }
}
