//! Declarative form validation.
//!
//! Rules are evaluated on submit. Each field reports at most one message,
//! the first rule it fails, and any entry blocks submission.

use std::collections::BTreeMap;

/// Field name → message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// No errors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless it already has one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Message for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` has an error.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Whether submission may proceed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Drop the error for `field`, typically once it is edited.
    pub fn clear(&mut self, field: &str) {
        self.0.remove(field);
    }

    /// Fold another error set into this one.
    pub fn extend(&mut self, other: Self) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }

    /// Errors in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }
}

/// A single check applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-blank after trimming.
    Required,
    /// At least this many characters after trimming.
    MinLength(usize),
    /// Basic `local@domain.tld` shape.
    Email,
    /// Exactly this many digits once non-digits are removed.
    Digits(usize),
}

impl Rule {
    fn check(self, label: &str, value: &str) -> Option<String> {
        let value = value.trim();
        match self {
            Self::Required if value.is_empty() => Some(format!("{label} is required")),
            Self::MinLength(n) if value.chars().count() < n => {
                Some(format!("{label} must be at least {n} characters"))
            },
            Self::Email if !is_valid_email(value) => Some("Enter a valid email address".to_string()),
            Self::Digits(n) if digits(value).len() != n => {
                Some(format!("{label} must be exactly {n} digits"))
            },
            _ => None,
        }
    }
}

/// Accumulates errors across a form.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    /// Start an empty validation pass.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a text field against `rules`, stopping at the first failure.
    #[must_use]
    pub fn field(mut self, name: &str, label: &str, value: &str, rules: &[Rule]) -> Self {
        if let Some(message) = rules.iter().find_map(|rule| rule.check(label, value)) {
            self.errors.add(name, message);
        }
        self
    }

    /// Check that a reference was selected and still points at something.
    #[must_use]
    pub fn selected<T>(mut self, name: &str, label: &str, value: Option<T>, resolves: impl FnOnce(&T) -> bool) -> Self {
        match value {
            None => self.errors.add(name, format!("Select a {label}")),
            Some(v) if !resolves(&v) => self.errors.add(name, format!("Select a valid {label}")),
            Some(_) => {},
        }
        self
    }

    /// Record an error when `ok` is false.
    #[must_use]
    pub fn require(mut self, name: &str, ok: bool, message: &str) -> Self {
        if !ok {
            self.errors.add(name, message);
        }
        self
    }

    /// Collected errors.
    #[must_use]
    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

/// Non-digit characters removed.
#[must_use]
pub fn digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Digits only, truncated to `max`.
#[must_use]
pub fn sanitize_digits(input: &str, max: usize) -> String {
    input.chars().filter(char::is_ascii_digit).take(max).collect()
}

/// Phone input as typed: at most 10 digits.
#[must_use]
pub fn sanitize_phone(input: &str) -> String {
    sanitize_digits(input, 10)
}

/// Pincode input as typed: at most 6 digits.
#[must_use]
pub fn sanitize_pincode(input: &str) -> String {
    sanitize_digits(input, 6)
}

/// `local@domain.tld` with no whitespace and a non-empty part on each side.
#[must_use]
pub fn is_valid_email(input: &str) -> bool {
    if input.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = input.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Rules shared by every personal-details form.
const NAME_RULES: &[Rule] = &[Rule::Required, Rule::MinLength(2)];
const EMAIL_RULES: &[Rule] = &[Rule::Required, Rule::Email];
const PHONE_RULES: &[Rule] = &[Rule::Required, Rule::Digits(10)];
const PINCODE_RULES: &[Rule] = &[Rule::Required, Rule::Digits(6)];

/// Personal details edited from the account area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
}

/// Account profile rule set.
#[must_use]
pub fn validate_profile(form: &ProfileForm) -> FieldErrors {
    Validator::new()
        .field("firstName", "First name", &form.first_name, NAME_RULES)
        .field("lastName", "Last name", &form.last_name, NAME_RULES)
        .field("email", "Email", &form.email, EMAIL_RULES)
        .field("phone", "Phone number", &form.phone, PHONE_RULES)
        .finish()
}

/// Booking customer-details rule set.
///
/// `city_resolves` reports whether the selected city is in the loaded list.
#[must_use]
pub fn validate_customer<C>(
    customer: &cyclecare_api::Customer,
    city_resolves: C,
) -> FieldErrors
where
    C: FnOnce(&cyclecare_api::CityId) -> bool,
{
    Validator::new()
        .field("firstName", "First name", &customer.first_name, NAME_RULES)
        .field("lastName", "Last name", &customer.last_name, NAME_RULES)
        .field("email", "Email", &customer.email, EMAIL_RULES)
        .field("phone", "Phone number", &customer.phone, PHONE_RULES)
        .field("addressLine1", "Address", &customer.address_line1, &[Rule::Required])
        .selected("city", "city", customer.city, city_resolves)
        .field("pincode", "Pincode", &customer.pincode, PINCODE_RULES)
        .finish()
}
