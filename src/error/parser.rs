use thiserror::Error;

/// Ошибка разбора атрибутов топика.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Ключ в форме `"key", "value"` остался без значения.
    #[error("missing value for key '{key}' at position {position}")]
    MissingValue { key: String, position: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_display() {
        let err = ParseError::MissingValue {
            key: "priority".to_string(),
            position: 1,
        };
        assert_eq!(
            err.to_string(),
            "missing value for key 'priority' at position 1"
        );
    }
}
