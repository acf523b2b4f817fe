//! vCard 3.0 payloads for contact QR codes

use serde::Deserialize;

/// Contact fields accepted by `/vcard`; all optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub organisation: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal: String,
    pub website: String,
}

/// Escape a text value (RFC 2426 §4)
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.full_name().is_empty() && self.organisation.trim().is_empty()
    }

    /// Newline-separated vCard 3.0 text
    pub fn to_vcard(&self) -> String {
        let lines = [
            "BEGIN:VCARD".to_string(),
            "VERSION:3.0".to_string(),
            format!("N:{};{}", escape(&self.last_name), escape(&self.first_name)),
            format!("FN:{}", escape(&self.full_name())),
            format!("ORG:{}", escape(&self.organisation)),
            format!("TITLE:{}", escape(&self.title)),
            format!("EMAIL:{}", escape(&self.email)),
            format!("TEL;TYPE=cell:{}", escape(&self.phone)),
            format!(
                "ADR;TYPE=Work:;;{};{};{};{};{}",
                escape(&self.street),
                escape(&self.city),
                escape(&self.state),
                escape(&self.postal),
                escape(&self.country)
            ),
            format!("URL:{}", escape(&self.website)),
            "END:VCARD".to_string(),
        ];
        lines.join("\n")
    }
}
