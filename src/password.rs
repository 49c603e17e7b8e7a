//! Host password rules
//!
//! Checked on the client before `passwordChange` is sent, so an obviously
//! bad password never reaches the daemon.

use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_LENGTH: usize = 8;

lazy_static! {
    static ref SIMPLE_ASCII: Regex = Regex::new(r"^[\x20-\x7F]*$").expect("valid regex");
}

/// Rules violated by `input` (and by its confirmation, if given)
///
/// Empty means the password may be sent.
pub fn check_new_password(input: &str, confirm: Option<&str>) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if input.is_empty() {
        errors.push("Password must not be empty");
    } else if input.chars().count() < MIN_LENGTH {
        errors.push("Password must be at least 8 characters long");
    }
    if input.contains('\'') {
        errors.push("Password MUST not include the quotes");
    }
    if !SIMPLE_ASCII.is_match(input) {
        errors.push("Password must include only simple ASCII characters");
    }
    if let Some(confirm) = confirm {
        if confirm != input {
            errors.push("Passwords do not match");
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        assert!(check_new_password("correct horse", Some("correct horse")).is_empty());
        assert!(check_new_password("abcdefgh", None).is_empty());
    }

    #[test]
    fn test_rules() {
        assert_eq!(
            check_new_password("short", None),
            vec!["Password must be at least 8 characters long"]
        );
        assert_eq!(
            check_new_password("it's a secret", None),
            vec!["Password MUST not include the quotes"]
        );
        assert_eq!(
            check_new_password("contraseña-larga", None),
            vec!["Password must include only simple ASCII characters"]
        );
        assert_eq!(
            check_new_password("abcdefgh", Some("abcdefgi")),
            vec!["Passwords do not match"]
        );
        assert_eq!(check_new_password("", None), vec!["Password must not be empty"]);
    }
}
