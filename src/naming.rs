//! Identifier to SQL name conversion.

use crate::error::OrmError;

const SEPARATOR: char = '_';
const PLURAL_SUFFIX: char = 's';

/// Lower-snake-case an ASCII identifier.
///
/// The first character is lowercased without a separator. Every later uppercase character
/// starts a new word unless it continues an acronym (`UserID` -> `user_id`, `ID` -> `id`).
/// An uppercase character after an underscore still gets its own separator, so
/// `imma_Table` becomes `imma__table`.
///
/// # Errors
/// Returns `OrmError::InvalidArgument` for empty or non-ASCII identifiers.
pub fn lower_snake_case(ident: &str) -> Result<String, OrmError> {
    if ident.is_empty() {
        return Err(OrmError::InvalidArgument(
            "cannot derive a SQL name from an empty identifier".to_string(),
        ));
    }
    if !ident.is_ascii() {
        return Err(OrmError::InvalidArgument(format!(
            "identifier {ident:?} is not ASCII; multi-byte names are unsupported"
        )));
    }

    let bytes = ident.as_bytes();
    let mut out = String::with_capacity(ident.len() + 4);

    for (idx, &b) in bytes.iter().enumerate() {
        if idx > 0 && b.is_ascii_uppercase() {
            let prev = bytes[idx - 1];
            let next_is_lower = bytes.get(idx + 1).is_some_and(u8::is_ascii_lowercase);
            let starts_word = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || prev == SEPARATOR as u8
                || (prev.is_ascii_uppercase() && next_is_lower);
            if starts_word {
                out.push(SEPARATOR);
            }
        }
        out.push(char::from(b.to_ascii_lowercase()));
    }

    Ok(out
        .trim_matches(SEPARATOR)
        .to_string())
}

/// Table name for a type identifier: lower snake case plus a naive plural suffix.
///
/// # Errors
/// Returns `OrmError::InvalidArgument` when the identifier cannot be converted.
pub fn table_name(type_name: &str) -> Result<String, OrmError> {
    let mut name = lower_snake_case(type_name)?;
    if !name.ends_with(PLURAL_SUFFIX) {
        name.push(PLURAL_SUFFIX);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_cases_camel_identifiers() {
        assert_eq!(
            lower_snake_case("HowNowBrownCow").unwrap(),
            "how_now_brown_cow"
        );
        assert_eq!(lower_snake_case("ID").unwrap(), "id");
        assert_eq!(lower_snake_case("UserID").unwrap(), "user_id");
        assert_eq!(lower_snake_case("HTTPServer").unwrap(), "http_server");
        assert_eq!(lower_snake_case("email_address").unwrap(), "email_address");
        assert_eq!(lower_snake_case("A").unwrap(), "a");
    }

    #[test]
    fn never_starts_or_ends_with_separator() {
        for ident in ["User", "UserProfileV", "AB", "Ab", "_Leading", "Trailing_"] {
            let out = lower_snake_case(ident).unwrap();
            assert!(!out.starts_with('_'), "{out}");
            assert!(!out.ends_with('_'), "{out}");
            assert_eq!(out, out.to_ascii_lowercase());
        }
    }

    #[test]
    fn uppercase_after_underscore_keeps_both_separators() {
        assert_eq!(lower_snake_case("imma_Table").unwrap(), "imma__table");
        assert_eq!(lower_snake_case("imma_table").unwrap(), "imma_table");
        assert_eq!(lower_snake_case("_Leading").unwrap(), "leading");
    }

    #[test]
    fn rejects_multibyte_identifiers() {
        let err = lower_snake_case("Ünicode").unwrap_err();
        assert!(matches!(err, OrmError::InvalidArgument(_)));
        assert!(lower_snake_case("").is_err());
    }

    #[test]
    fn pluralizes_table_names() {
        assert_eq!(table_name("User").unwrap(), "users");
        assert_eq!(table_name("Address").unwrap(), "address");
        assert_eq!(table_name("BlogPost").unwrap(), "blog_posts");
        assert_eq!(table_name("users").unwrap(), "users");
    }
}
