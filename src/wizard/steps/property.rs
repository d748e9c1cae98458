//! Rule providers for the seven-step property listing wizard.

use super::{StepContext, StepDefinition};
use chrono::Datelike;

use crate::wizard::record::MergedRecord;
use crate::wizard::rules::lookup;
use crate::wizard::rules::{push_error, Check, FieldErrors, FieldRule, StepRules};

pub(super) static STEPS: &[StepDefinition] = &[
    StepDefinition {
        index: 1,
        name: "basics",
        provider: basics,
    },
    StepDefinition {
        index: 2,
        name: "location",
        provider: location,
    },
    StepDefinition {
        index: 3,
        name: "specifications",
        provider: specifications,
    },
    StepDefinition {
        index: 4,
        name: "pricing",
        provider: pricing,
    },
    StepDefinition {
        index: 5,
        name: "amenities",
        provider: amenities,
    },
    StepDefinition {
        index: 6,
        name: "media",
        provider: media,
    },
    StepDefinition {
        index: 7,
        name: "publication",
        provider: publication,
    },
];

/// Root field names the property entity owns. Transient UI-only keys such as
/// the client-side `image_order` array are absent on purpose and therefore
/// dropped before persistence.
pub const ENTITY_FIELD_ROOTS: &[&str] = &[
    "title",
    "property_type",
    "property_subtype",
    "description",
    "street",
    "house_number",
    "city",
    "postal_code",
    "country",
    "size_sqm",
    "year_built",
    "bedrooms",
    "bathrooms",
    "room_size_sqm",
    "floor_area_sqm",
    "rent_amount",
    "deposit_amount",
    "service_costs",
    "available_from",
    "min_lease_months",
    "max_lease_months",
    "furnished",
    "pets_allowed",
    "smoking_allowed",
    "utilities",
    "images",
    "floor_plan",
    "contact_email",
    "contact_phone",
    "viewing_days",
    "listing_duration_weeks",
];

fn basics(_record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    StepRules::with_after(
        vec![
            FieldRule::required("title").check(Check::Text { min: 5, max: 120 }),
            FieldRule::required("property_type").check(Check::OneOf(lookup::PROPERTY_TYPES)),
            FieldRule::required("property_subtype").check(Check::Text { min: 1, max: 50 }),
            FieldRule::required("description").check(Check::Text {
                min: 30,
                max: 5000,
            }),
        ],
        subtype_belongs_to_type,
    )
}

/// The declarative pass cannot see both fields at once; membership of the
/// subtype in the chosen type's set is checked here.
fn subtype_belongs_to_type(
    record: &MergedRecord,
    _ctx: &StepContext<'_>,
    errors: &mut FieldErrors,
) {
    let (Some(property_type), Some(subtype)) =
        (record.text("property_type"), record.text("property_subtype"))
    else {
        return;
    };
    if let Some(allowed) = lookup::subtypes_for(property_type) {
        if !allowed.contains(&subtype) {
            push_error(
                errors,
                "property_subtype",
                format!("subtype '{subtype}' is not available for type '{property_type}'"),
            );
        }
    }
}

fn location(_record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    StepRules::new(vec![
        FieldRule::required("street").check(Check::Text { min: 1, max: 200 }),
        FieldRule::required("house_number").check(Check::Text { min: 1, max: 20 }),
        FieldRule::required("city").check(Check::Text { min: 1, max: 100 }),
        FieldRule::required("postal_code").check(Check::PostalCode),
        FieldRule::required("country").check(Check::Text { min: 2, max: 100 }),
    ])
}

fn specifications(_record: &MergedRecord, ctx: &StepContext<'_>) -> StepRules {
    let current_year = ctx.today.year() as i64;
    StepRules::with_after(
        vec![
            FieldRule::required("size_sqm").check(Check::Numeric {
                min: Some(1.0),
                max: None,
            }),
            FieldRule::optional("year_built").check(Check::Integer {
                min: Some(1800),
                max: Some(current_year),
            }),
            FieldRule::optional("bedrooms").check(Check::Integer {
                min: Some(0),
                max: Some(20),
            }),
            FieldRule::optional("bathrooms").check(Check::Integer {
                min: Some(1),
                max: Some(10),
            }),
            FieldRule::optional("room_size_sqm").check(Check::Numeric {
                min: Some(1.0),
                max: None,
            }),
            FieldRule::optional("floor_area_sqm").check(Check::Numeric {
                min: Some(1.0),
                max: None,
            }),
        ],
        specs_required_by_type,
    )
}

/// Which specification fields are mandatory depends on the property type
/// chosen back in step 1.
fn specs_required_by_type(record: &MergedRecord, _ctx: &StepContext<'_>, errors: &mut FieldErrors) {
    let required: &[&str] = match record.text("property_type") {
        Some("apartment") | Some("house") => &["bedrooms", "bathrooms"],
        Some("room") => &["room_size_sqm"],
        Some("commercial") => &["floor_area_sqm"],
        _ => &[],
    };
    for field in required {
        if record.is_blank(field) {
            push_error(
                errors,
                field,
                format!("{} is required for this property type", field.replace('_', " ")),
            );
        }
    }
}

fn pricing(_record: &MergedRecord, ctx: &StepContext<'_>) -> StepRules {
    StepRules::with_after(
        vec![
            FieldRule::required("rent_amount").check(Check::Numeric {
                min: Some(1.0),
                max: None,
            }),
            FieldRule::optional("deposit_amount").check(Check::Numeric {
                min: Some(0.0),
                max: None,
            }),
            FieldRule::optional("service_costs").check(Check::Numeric {
                min: Some(0.0),
                max: None,
            }),
            FieldRule::required("available_from")
                .check(Check::Date)
                .check(Check::DateNotBefore(ctx.today)),
            FieldRule::optional("min_lease_months").check(Check::Integer {
                min: Some(1),
                max: Some(240),
            }),
            FieldRule::optional("max_lease_months").check(Check::Integer {
                min: Some(1),
                max: Some(240),
            }),
        ],
        lease_term_ordering,
    )
}

fn lease_term_ordering(record: &MergedRecord, _ctx: &StepContext<'_>, errors: &mut FieldErrors) {
    if let (Some(min), Some(max)) = (
        record.number("min_lease_months"),
        record.number("max_lease_months"),
    ) {
        if max < min {
            push_error(
                errors,
                "max_lease_months",
                "must be greater than or equal to min lease months".to_string(),
            );
        }
    }
}

fn amenities(_record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    StepRules::new(vec![
        FieldRule::required("furnished").check(Check::OneOf(lookup::FURNISHING_LEVELS)),
        FieldRule::required("pets_allowed").check(Check::Boolean),
        FieldRule::required("smoking_allowed").check(Check::Boolean),
        FieldRule::optional("utilities").check(Check::MaxEntries(10)),
        FieldRule::required("utilities.*").check(Check::OneOf(lookup::UTILITIES)),
    ])
}

fn media(_record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    // Persisted draft images merge back into the record, so a previously
    // uploaded set keeps satisfying the minimum without re-upload.
    StepRules::new(vec![
        FieldRule::optional("images")
            .check(Check::MinEntries(1))
            .check(Check::MaxEntries(20)),
        FieldRule::required("images.*").check(Check::Attachment),
        FieldRule::optional("floor_plan").check(Check::Attachment),
    ])
}

fn publication(_record: &MergedRecord, _ctx: &StepContext<'_>) -> StepRules {
    StepRules::new(vec![
        FieldRule::required("contact_email").check(Check::Email),
        FieldRule::required("contact_phone").check(Check::Phone),
        FieldRule::optional("viewing_days").check(Check::MaxEntries(7)),
        FieldRule::required("viewing_days.*").check(Check::OneOf(lookup::WEEKDAYS)),
        FieldRule::required("listing_duration_weeks").check(Check::Integer {
            min: Some(1),
            max: Some(52),
        }),
    ])
}
