use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email regex")
});

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("username regex"));

/// Accumulating input validator. Each check is independent and composable; a
/// caller runs the relevant subset on a fresh instance and inspects
/// `has_errors()`/`errors()` afterward. No state is shared across instances.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.errors.push(format!("{} is required", field));
            return false;
        }
        true
    }

    pub fn validate_email(&mut self, value: &str) -> bool {
        if !EMAIL_RE.is_match(value) {
            self.errors
                .push("Email address is not valid".to_string());
            return false;
        }
        true
    }

    /// Password complexity: minimum length plus upper/lower/digit/special
    /// class membership.
    pub fn validate_password(&mut self, value: &str) -> bool {
        let before = self.errors.len();
        if value.chars().count() < 8 {
            self.errors
                .push("Password must be at least 8 characters in length".to_string());
        }
        if !value.chars().any(|c| c.is_ascii_uppercase()) {
            self.errors
                .push("Password must contain an uppercase letter".to_string());
        }
        if !value.chars().any(|c| c.is_ascii_lowercase()) {
            self.errors
                .push("Password must contain a lowercase letter".to_string());
        }
        if !value.chars().any(|c| c.is_ascii_digit()) {
            self.errors
                .push("Password must contain a digit".to_string());
        }
        if !value.chars().any(|c| !c.is_ascii_alphanumeric()) {
            self.errors
                .push("Password must contain a special character".to_string());
        }
        self.errors.len() == before
    }

    pub fn validate_username(&mut self, value: &str) -> bool {
        if !USERNAME_RE.is_match(value) {
            self.errors.push(
                "Username must be 3-30 characters of letters, digits, or underscores".to_string(),
            );
            return false;
        }
        true
    }

    pub fn validate_length(&mut self, field: &str, value: &str, min: usize, max: usize) -> bool {
        let len = value.chars().count();
        if len < min || len > max {
            self.errors.push(format!(
                "{} must be between {} and {} characters",
                field, min, max
            ));
            return false;
        }
        true
    }

    /// Upload checks: extension whitelist plus size cap. MIME sniffing is the
    /// web server's concern; the extension check mirrors what reaches the
    /// database.
    pub fn validate_upload(
        &mut self,
        filename: &str,
        size: u64,
        allowed_extensions: &[String],
        max_size: u64,
    ) -> bool {
        let before = self.errors.len();
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        if !allowed_extensions.iter().any(|e| *e == extension) {
            self.errors.push(format!(
                "File type .{} is not allowed (allowed: {})",
                extension,
                allowed_extensions.join(", ")
            ));
        }
        if size > max_size {
            self.errors
                .push(format!("File exceeds the maximum size of {} bytes", max_size));
        }
        self.errors.len() == before
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
