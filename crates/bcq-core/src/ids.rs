//! Identifier helpers shared by every command.

/// Returns true when `token` is a non-empty run of ASCII digits.
///
/// Signs, whitespace and mixed tokens such as `123abc` are not IDs.
pub fn is_numeric_id(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Person tokens containing `@` are matched against email addresses
/// before names.
pub fn looks_like_email(token: &str) -> bool {
    token.contains('@')
}
