use serde::{Deserialize, Serialize};

/// Numeric identifier used by the marketplace API for reference data.
pub type EntityId = i64;

/// Airport record returned by the airport autocomplete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Airport {
    /// Label shown in the autocomplete list, e.g. `CDG · Paris Charles de Gaulle`.
    pub fn label(&self) -> String {
        match self.city.as_deref() {
            Some(city) if !city.is_empty() => format!("{} · {} ({city})", self.code, self.name),
            _ => format!("{} · {}", self.code, self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: EntityId,
    pub code: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Airline resolved from a flight number prefix.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Airline {
    pub name: String,
    #[serde(default)]
    pub iata_code: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationType {
    #[default]
    Single,
    Shared,
}

impl ReservationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationType::Single => "single",
            ReservationType::Shared => "shared",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingType {
    #[default]
    Instant,
    NonInstant,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Instant => "instant",
            BookingType::NonInstant => "non-instant",
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, BookingType::Instant)
    }
}

/// Local image picked by the user, kept in memory until submission.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Guesses the MIME type from the file extension.
    pub fn from_path_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let lower = file_name.to_ascii_lowercase();
        let mime_type = if lower.ends_with(".png") {
            "image/png"
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            "image/jpeg"
        } else if lower.ends_with(".webp") {
            "image/webp"
        } else if lower.ends_with(".gif") {
            "image/gif"
        } else {
            "application/octet-stream"
        };
        Self::new(file_name, mime_type, bytes)
    }
}

/// Identifier of a listing created by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
