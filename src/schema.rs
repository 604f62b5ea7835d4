//! Declarative request-body validation.
//!
//! A [`Schema`] describes the fields a request body may carry: whether each
//! is required, its length bounds, and a named format or a regular-expression
//! pattern it must match. [`Schema::compile`] turns the description into a
//! reusable [`CompiledSchema`] whose [`validate`](CompiledSchema::validate)
//! checks untrusted bytes before they reach any side-effecting operation.
//!
//! Violations are collected across all fields and reported together, so the
//! caller can surface every problem at once instead of one at a time. Within
//! a single field the checks run in a fixed order (type, then format or
//! pattern, then length) and the first failure wins, keeping the report to
//! one entry per field.
//!
//! On success the input is narrowed to exactly the declared fields; nothing
//! the schema does not name survives into the validated data.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::schema::{Schema, FieldRule, Format, Outcome};
//!
//! let schema = Schema::new()
//!     .field(FieldRule::string("email").length(5, 255).format(Format::Email))
//!     .field(FieldRule::string("password").length(8, 100))
//!     .deny_unknown_fields()
//!     .compile();
//!
//! match schema.validate(br#"{"email":"a@b.com","password":"Abcdef1!"}"#) {
//!     Outcome::Valid(data) => { /* data holds only email and password */ }
//!     Outcome::Invalid(errors) => { /* one entry per offending field */ }
//! }
//! ```

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::blobs::split_image_data_url;

/// Upper bound on the image payload, sized for a multi-megabyte base64 body.
pub const MAX_IMAGE_PAYLOAD_CHARS: usize = 5_242_880;

// ============================================================================
// Violations
// ============================================================================

/// A single violated constraint, named by the offending field.
///
/// `field` is `None` only for body-level failures (the input was not a JSON
/// object at all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Path of the offending field within the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// What the field failed to satisfy.
    pub message: String,
}

impl FieldViolation {
    /// Violation attributed to a named field.
    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Body-level violation with no field.
    pub fn body(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

/// Result of validating raw input against a compiled schema.
#[derive(Debug)]
pub enum Outcome {
    /// The input satisfied every constraint; the map holds only the fields
    /// the schema declares.
    Valid(Map<String, Value>),
    /// At least one constraint was violated.
    Invalid(Vec<FieldViolation>),
}

impl Outcome {
    /// Whether validation succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

// ============================================================================
// Field Rules
// ============================================================================

/// Named formats a string field may be constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Structurally plausible email address.
    Email,
    /// Password complexity: at least one lowercase letter, one uppercase
    /// letter, one digit, and one symbol from `@$!%*?&`, with no characters
    /// outside that set. Independent of any length bounds on the same field.
    Password,
    /// Base64 image data URL (`data:image/<subtype>;base64,` prefix).
    ImageDataUrl,
}

/// Declarative constraints for one string field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: &'static str,
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    format: Option<Format>,
    pattern: Option<Regex>,
}

impl FieldRule {
    /// A required string field. Every field in scope is a string; non-string
    /// JSON values fail the type check.
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            min_length: None,
            max_length: None,
            format: None,
            pattern: None,
        }
    }

    /// Mark the field optional; absent values are not an error.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Inclusive character-count bounds.
    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Constrain the field to a named format.
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Constrain the field to a pre-compiled regular expression.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Check a present value, reporting the first failing constraint.
    fn check(&self, value: &Value) -> Option<FieldViolation> {
        let text = match value {
            Value::String(s) => s,
            _ => return Some(FieldViolation::for_field(self.name, "must be a string")),
        };

        if let Some(format) = self.format {
            if let Some(message) = check_format(format, text) {
                return Some(FieldViolation::for_field(self.name, message));
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return Some(FieldViolation::for_field(
                    self.name,
                    "does not match the expected format",
                ));
            }
        }

        let len = text.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Some(FieldViolation::for_field(
                    self.name,
                    format!("must be at least {} characters", min),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Some(FieldViolation::for_field(
                    self.name,
                    format!("must be at most {} characters", max),
                ));
            }
        }

        None
    }
}

fn check_format(format: Format, text: &str) -> Option<&'static str> {
    match format {
        Format::Email => {
            if is_plausible_email(text) {
                None
            } else {
                Some("must be a valid email address")
            }
        }
        Format::Password => {
            if satisfies_password_complexity(text) {
                None
            } else {
                Some(
                    "must contain at least one lowercase letter, one uppercase letter, \
                     one digit, and one special character (@$!%*?&)",
                )
            }
        }
        Format::ImageDataUrl => {
            if split_image_data_url(text).is_some() {
                None
            } else {
                Some("must be a base64-encoded image data URL")
            }
        }
    }
}

/// Pragmatic structural email check: accepts most valid addresses while
/// rejecting obviously malformed ones. Does not validate deliverability.
fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    let local = match parts.next() {
        Some(l) => l,
        None => return false,
    };
    let domain = match parts.next() {
        Some(d) => d,
        None => return false,
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
        return false;
    }
    domain.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '-')
}

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

fn satisfies_password_complexity(value: &str) -> bool {
    let mut has_lower = false;
    let mut has_upper = false;
    let mut has_digit = false;
    let mut has_symbol = false;

    for c in value.chars() {
        if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if PASSWORD_SYMBOLS.contains(c) {
            has_symbol = true;
        } else {
            // Characters outside the allowed class fail the constraint.
            return false;
        }
    }

    has_lower && has_upper && has_digit && has_symbol
}

// ============================================================================
// Schema
// ============================================================================

/// Declarative description of a request body.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<FieldRule>,
    deny_unknown_fields: bool,
}

impl Schema {
    /// Empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field rule.
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    /// Reject any field the schema does not declare.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown_fields = true;
        self
    }

    /// Freeze the description into a reusable validator.
    pub fn compile(self) -> CompiledSchema {
        CompiledSchema {
            fields: self.fields,
            deny_unknown_fields: self.deny_unknown_fields,
        }
    }
}

/// A compiled, reusable validator: a pure function of the [`Schema`] it was
/// built from.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    fields: Vec<FieldRule>,
    deny_unknown_fields: bool,
}

impl CompiledSchema {
    /// Validate raw request bytes.
    ///
    /// Input that is not a JSON object yields a single body-level violation.
    /// Otherwise every declared field is checked and every unknown field is
    /// flagged (when the schema denies them); all offending fields are
    /// reported together.
    pub fn validate(&self, raw: &[u8]) -> Outcome {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(v) => v,
            Err(_) => {
                return Outcome::Invalid(vec![FieldViolation::body(
                    "request body must be a JSON object",
                )]);
            }
        };
        let object = match value {
            Value::Object(m) => m,
            _ => {
                return Outcome::Invalid(vec![FieldViolation::body(
                    "request body must be a JSON object",
                )]);
            }
        };

        let mut errors = Vec::new();

        for rule in &self.fields {
            match object.get(rule.name) {
                Some(value) => {
                    if let Some(violation) = rule.check(value) {
                        errors.push(violation);
                    }
                }
                None => {
                    if rule.required {
                        errors.push(FieldViolation::for_field(rule.name, "is required"));
                    }
                }
            }
        }

        if self.deny_unknown_fields {
            for key in object.keys() {
                if !self.fields.iter().any(|rule| rule.name == key) {
                    errors.push(FieldViolation::for_field(key.clone(), "is not allowed"));
                }
            }
        }

        if !errors.is_empty() {
            return Outcome::Invalid(errors);
        }

        // Narrow to declared fields only.
        let mut data = Map::new();
        for rule in &self.fields {
            if let Some(value) = object.get(rule.name) {
                data.insert(rule.name.to_string(), value.clone());
            }
        }
        Outcome::Valid(data)
    }
}

// ============================================================================
// Concrete Schemas
// ============================================================================

fn email_rule() -> FieldRule {
    FieldRule::string("email").length(5, 255).format(Format::Email)
}

/// Schema for the authentication request body.
pub fn login_schema() -> &'static CompiledSchema {
    static SCHEMA: OnceLock<CompiledSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new()
            .field(email_rule())
            .field(FieldRule::string("password").length(8, 100))
            .deny_unknown_fields()
            .compile()
    })
}

/// Schema for the registration request body.
///
/// The password carries both length bounds and the complexity format; the
/// two constraints are deliberately independent and report distinct messages.
pub fn signup_schema() -> &'static CompiledSchema {
    static SCHEMA: OnceLock<CompiledSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new()
            .field(email_rule())
            .field(
                FieldRule::string("password")
                    .length(8, 100)
                    .format(Format::Password),
            )
            .field(FieldRule::string("name").length(2, 100))
            .field(
                FieldRule::string("profileImage")
                    .optional()
                    .format(Format::ImageDataUrl),
            )
            .deny_unknown_fields()
            .compile()
    })
}

/// Schema for the profile-image attachment request body.
pub fn image_upload_schema() -> &'static CompiledSchema {
    static SCHEMA: OnceLock<CompiledSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::new()
            .field(
                FieldRule::string("image")
                    .length(1, MAX_IMAGE_PAYLOAD_CHARS)
                    .format(Format::ImageDataUrl),
            )
            .deny_unknown_fields()
            .compile()
    })
}

// ============================================================================
// Tests
// ============================================================================
