//! Shared value sets and format patterns consumed by the step rule providers.

use once_cell::sync::Lazy;
use regex::Regex;

pub static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]{2,}$").expect("email pattern compiles"));

pub static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().\-]{5,19}$").expect("phone pattern compiles"));

pub static POSTAL_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{1,9}$").expect("postal code pattern compiles")
});

pub const EMPLOYMENT_STATUSES: &[&str] =
    &["employed", "self_employed", "student", "unemployed", "retired"];

pub const HOUSING_STATUSES: &[&str] = &[
    "renting",
    "homeowner",
    "living_with_family",
    "student_housing",
    "other",
];

pub const PET_SPECIES: &[&str] = &["dog", "cat", "bird", "fish", "rodent", "reptile", "other"];

pub const REFERENCE_RELATIONSHIPS: &[&str] = &["previous_landlord", "employer", "personal"];

pub const DOCUMENT_CATEGORIES: &[&str] =
    &["payslip", "bank_statement", "reference_letter", "other"];

pub const PROPERTY_TYPES: &[&str] = &["apartment", "house", "room", "commercial"];

pub const FURNISHING_LEVELS: &[&str] = &["furnished", "partly_furnished", "unfurnished"];

pub const UTILITIES: &[&str] = &["electricity", "gas", "water", "internet", "heating", "tv"];

pub const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Subtypes permitted for each property type. The membership check runs as a
/// post-pass hook because it spans two fields.
pub fn subtypes_for(property_type: &str) -> Option<&'static [&'static str]> {
    match property_type {
        "apartment" => Some(&["studio", "loft", "penthouse", "duplex", "standard"]),
        "house" => Some(&["detached", "semi_detached", "terraced", "bungalow"]),
        "room" => Some(&["private_room", "shared_room"]),
        "commercial" => Some(&["office", "retail", "warehouse"]),
        _ => None,
    }
}
