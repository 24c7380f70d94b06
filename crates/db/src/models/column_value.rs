//! Typed column values for single-field writes.
//!
//! A [`FieldValue`] from the UI is converted to a [`ColumnValue`] according to
//! the target column's kind before any SQL is issued, so a value of the wrong
//! shape never reaches the database. Lock columns only accept booleans.

use expo_core::backend::BackendError;
use expo_core::marker::{ColumnKind, FieldValue, MarkerField};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// A value ready to be bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Float(Option<f64>),
    Text(Option<String>),
    Json(Option<serde_json::Value>),
    Bool(bool),
}

impl ColumnValue {
    /// Convert `value` for the column backing `field`.
    pub fn for_field(field: MarkerField, value: &FieldValue) -> Result<Self, BackendError> {
        let mismatch = |expected: &'static str| BackendError::TypeMismatch {
            column: field.column(),
            expected,
            actual: value.type_name(),
        };

        match field.kind() {
            ColumnKind::Float => match value {
                FieldValue::Null => Ok(Self::Float(None)),
                FieldValue::Number(n) => Ok(Self::Float(Some(*n))),
                _ => Err(mismatch("number")),
            },
            ColumnKind::Text => match value {
                FieldValue::Null => Ok(Self::Text(None)),
                FieldValue::Text(s) => Ok(Self::Text(Some(s.clone()))),
                // Booth numbers are often typed as plain numbers.
                FieldValue::Number(n) => Ok(Self::Text(Some(n.to_string()))),
                _ => Err(mismatch("text")),
            },
            ColumnKind::Json => match value {
                FieldValue::Null => Ok(Self::Json(None)),
                other => serde_json::to_value(other)
                    .map(|json| Self::Json(Some(json)))
                    .map_err(|e| BackendError::Database(e.to_string())),
            },
            ColumnKind::Bool => match value {
                FieldValue::Bool(b) => Ok(Self::Bool(*b)),
                _ => Err(mismatch("bool")),
            },
        }
    }

    /// Bind this value as the next placeholder of `query`.
    pub fn bind<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            Self::Float(v) => query.bind(v),
            Self::Text(v) => query.bind(v),
            Self::Json(v) => query.bind(v),
            Self::Bool(v) => query.bind(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_bind_to_float_columns() {
        let v = ColumnValue::for_field(MarkerField::Lat, &FieldValue::Number(10.5)).unwrap();
        assert_eq!(v, ColumnValue::Float(Some(10.5)));
    }

    #[test]
    fn null_is_accepted_for_nullable_columns() {
        assert_eq!(
            ColumnValue::for_field(MarkerField::Lat, &FieldValue::Null).unwrap(),
            ColumnValue::Float(None)
        );
        assert_eq!(
            ColumnValue::for_field(MarkerField::Website, &FieldValue::Null).unwrap(),
            ColumnValue::Text(None)
        );
        assert_eq!(
            ColumnValue::for_field(MarkerField::IconSize, &FieldValue::Null).unwrap(),
            ColumnValue::Json(None)
        );
    }

    #[test]
    fn lock_columns_only_take_booleans() {
        assert_eq!(
            ColumnValue::for_field(MarkerField::CoreLocked, &FieldValue::Bool(true)).unwrap(),
            ColumnValue::Bool(true)
        );
        for bad in [
            FieldValue::Null,
            FieldValue::Number(1.0),
            FieldValue::from("true"),
        ] {
            let err = ColumnValue::for_field(MarkerField::CoreLocked, &bad).unwrap_err();
            assert!(matches!(
                err,
                BackendError::TypeMismatch {
                    column: "core_locked",
                    expected: "bool",
                    ..
                }
            ));
        }
    }

    #[test]
    fn numeric_booth_number_is_stored_as_text() {
        let v = ColumnValue::for_field(MarkerField::BoothNumber, &FieldValue::Number(12.0))
            .unwrap();
        assert_eq!(v, ColumnValue::Text(Some("12".to_string())));
    }

    #[test]
    fn lists_become_json_arrays() {
        let v = ColumnValue::for_field(
            MarkerField::GlyphAnchor,
            &FieldValue::List(vec![16.0.into(), 32.0.into()]),
        )
        .unwrap();
        assert_eq!(v, ColumnValue::Json(Some(serde_json::json!([16.0, 32.0]))));
    }

    #[test]
    fn text_in_float_column_is_rejected() {
        let err = ColumnValue::for_field(MarkerField::Angle, &FieldValue::from("45")).unwrap_err();
        assert!(err.to_string().contains("angle"));
    }
}
