use serde::Deserialize;

/// Incoming doctor identity payload. Every field may be absent or blank;
/// an all-blank payload means "remove the assignment".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl DoctorPayload {
    pub fn is_empty(&self) -> bool {
        is_blank(&self.name) && is_blank(&self.email) && is_blank(&self.phone)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}
