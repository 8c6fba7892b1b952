/// Visitor contact validation and identity.
///
/// Chat visitors are anonymous unless the microsite form hands us an email or
/// phone. Those values are cleaned here and hashed into a `visitor_key` so a
/// returning visitor lands back in their existing session for a property.
use once_cell::sync::Lazy;
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Contact details optionally supplied with a chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// RFC 5322 simplified: local@domain.tld
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("valid email regex")
});

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Placeholder patterns typed into lead forms (000000, 111111, ...)
/// - Minimum length requirements
/// - Valid domain structure
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let fake_patterns = ["000000", "111111", "999999", "123456789"];
    if let Some(pattern) = fake_patterns.iter().find(|p| email.contains(*p)) {
        tracing::warn!("Invalid email detected (placeholder pattern '{}')", pattern);
        return false;
    }

    EMAIL_RE.is_match(email)
}

/// Parses a North American phone number and returns it in E.164 (+15551234567).
///
/// Numbers with an explicit `+` country code are accepted for any region.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() < 7 {
        return None;
    }

    match phonenumber::parse(Some(CountryId::US), trimmed) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.format().mode(Mode::E164).to_string())
        }
        Ok(_) => {
            tracing::debug!("Phone number failed validation");
            None
        }
        Err(e) => {
            tracing::debug!("Failed to parse phone number: {:?}", e);
            None
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl VisitorInfo {
    /// Trims every field, lower-cases the email and drops contact values that fail validation.
    pub fn sanitized(&self) -> Self {
        let email = non_blank(self.email.as_deref())
            .map(|e| e.to_lowercase())
            .filter(|e| {
                let ok = is_valid_email(e);
                if !ok {
                    tracing::warn!("Dropping invalid visitor email");
                }
                ok
            });

        let phone = non_blank(self.phone.as_deref()).and_then(|p| {
            let normalized = normalize_phone(&p);
            if normalized.is_none() {
                tracing::warn!("Dropping invalid visitor phone");
            }
            normalized
        });

        Self {
            name: non_blank(self.name.as_deref()),
            email,
            phone,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }

    /// Stable fingerprint of a sanitized visitor: email first, phone as fallback.
    pub fn visitor_key(&self) -> Option<String> {
        let identity = if let Some(email) = &self.email {
            format!("email:{}", email)
        } else if let Some(phone) = &self.phone {
            format!("phone:{}", phone)
        } else {
            return None;
        };

        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        Some(hex::encode(hasher.finalize()))
    }
}
