use picoles_core::validation::{normalize_exact, normalize_text, ValidationError};
use proptest::prelude::*;

proptest! {
    /// Property: accepted text is trimmed, upper-cased and within bounds
    #[test]
    fn prop_normalized_text_is_trimmed_and_uppercase(raw in "[ a-zA-Z0-9à-ü\t]{0,60}") {
        match normalize_text("nome", &raw, 45) {
            Ok(value) => {
                prop_assert_eq!(value.trim(), value.as_str());
                prop_assert_eq!(value.to_uppercase(), value.clone());
                prop_assert!(!value.is_empty());
                prop_assert!(value.chars().count() <= 45);
            }
            Err(ValidationError::Blank { .. }) => {
                prop_assert!(raw.trim().is_empty());
            }
            Err(ValidationError::TooLong { max, .. }) => {
                prop_assert_eq!(max, 45);
                prop_assert!(raw.trim().to_uppercase().chars().count() > 45);
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Property: surrounding whitespace never changes the stored value
    #[test]
    fn prop_padding_is_irrelevant(core in "[a-zA-Z0-9]{1,20}", left in "[ \t]{0,5}", right in "[ \t\n]{0,5}") {
        let padded = format!("{left}{core}{right}");
        prop_assert_eq!(
            normalize_text("nome", &padded, 45).unwrap(),
            normalize_text("nome", &core, 45).unwrap()
        );
    }

    /// Property: whitespace-only input is always blank
    #[test]
    fn prop_whitespace_only_is_blank(raw in "[ \t\n\r]{0,10}") {
        prop_assert_eq!(
            normalize_text("contato", &raw, 100),
            Err(ValidationError::Blank { field: "contato" })
        );
    }

    /// Property: exact-length fields accept only the declared length
    #[test]
    fn prop_exact_length(digits in "[0-9]{1,20}") {
        let result = normalize_exact("cnpj", &digits, 14);
        if digits.len() == 14 {
            prop_assert_eq!(result.unwrap(), digits);
        } else {
            let is_wrong_length = matches!(result, Err(ValidationError::WrongLength { expected: 14, .. }));
            prop_assert!(is_wrong_length);
        }
    }
}
