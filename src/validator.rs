use crate::error::{SchemaValidationError, ValidationError};
use crate::schema::{Schema, render_value};

pub const REQUIRED_FIELDS: [&str; 3] = ["account_number", "plot_number", "owner_name"];

pub fn validate(schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (key, value) in schema.entries() {
        if !value.is_string() {
            errors.push(ValidationError::NonStringEntry {
                key: key.to_string(),
                value: render_value(value),
            });
        }
    }

    let values = schema
        .string_entries()
        .map(|(_, field)| field)
        .collect::<Vec<_>>();

    let mut reported = Vec::<&str>::new();
    for (index, field) in values.iter().enumerate() {
        if reported.contains(field) {
            continue;
        }
        if values[index + 1..].contains(field) {
            reported.push(*field);
            errors.push(ValidationError::DuplicateTarget((*field).to_string()));
        }
    }

    for required in REQUIRED_FIELDS {
        if !values.contains(&required) {
            errors.push(ValidationError::MissingRequiredField(required.to_string()));
        }
    }

    errors
}

pub fn ensure_valid(name: &str, schema: &Schema) -> Result<(), SchemaValidationError> {
    let errors = validate(schema);
    if errors.is_empty() {
        return Ok(());
    }
    Err(SchemaValidationError {
        schema: name.to_string(),
        errors,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ensure_valid, validate};
    use crate::error::ValidationError;
    use crate::schema::Schema;

    #[test]
    fn builtin_default_is_valid() {
        assert!(validate(&Schema::builtin_default()).is_empty());
    }

    #[test]
    fn unique_entries_covering_required_fields_are_valid() {
        let schema = Schema::from_pairs([
            ("खाता", "account_number"),
            ("खसरा", "plot_number"),
            ("मालिक", "owner_name"),
            ("फसल", "crop"),
        ]);
        assert!(validate(&schema).is_empty());
    }

    #[test]
    fn plot_only_schema_reports_two_missing_fields() {
        let schema = Schema::from_pairs([("खसरा नंबर", "plot_number")]);
        let errors = validate(&schema);
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingRequiredField("account_number".to_string()),
                ValidationError::MissingRequiredField("owner_name".to_string()),
            ]
        );
    }

    #[test]
    fn each_repeated_value_is_reported_once() {
        let schema = Schema::from_pairs([
            ("खाता संख्या", "account_number"),
            ("खाता नं", "account_number"),
            ("खाता", "account_number"),
            ("खसरा नंबर", "plot_number"),
            ("किला", "plot_number"),
            ("नाम", "owner_name"),
        ]);
        let errors = validate(&schema);
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateTarget("account_number".to_string()),
                ValidationError::DuplicateTarget("plot_number".to_string()),
            ]
        );
    }

    #[test]
    fn all_checks_run_without_short_circuit() {
        let value = json!({
            "रकबा": 12,
            "खसरा नंबर": "plot_number",
            "किला": "plot_number"
        });
        let schema: Schema = serde_json::from_value(value).expect("object");
        let errors = validate(&schema);

        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors[0],
            ValidationError::NonStringEntry {
                key: "रकबा".to_string(),
                value: "12".to_string(),
            }
        );
        assert_eq!(
            errors[1],
            ValidationError::DuplicateTarget("plot_number".to_string())
        );
        assert!(matches!(errors[2], ValidationError::MissingRequiredField(_)));
        assert!(matches!(errors[3], ValidationError::MissingRequiredField(_)));
    }

    #[test]
    fn ensure_valid_carries_every_finding() {
        let err = ensure_valid("Custom", &Schema::default()).expect_err("empty schema is invalid");
        assert_eq!(err.schema, "Custom");
        assert_eq!(err.errors.len(), 3);
        assert!(err.to_string().contains("missing required field: owner_name"));
    }
}
