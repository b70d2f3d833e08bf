//! Normalization of user-supplied account fields.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left untouched by URI component encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const DEFAULT_AVATAR_BASE: &str = "https://api.dicebear.com/8.x/initials/svg?seed=";

/// Collapse whitespace and capitalize each word: `"ada  LOVELACE"` becomes `"Ada Lovelace"`.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed, lowercased email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generated initials avatar for users who did not provide a picture.
pub fn default_avatar_url(full_name: &str) -> String {
    format!(
        "{DEFAULT_AVATAR_BASE}{}",
        utf8_percent_encode(full_name, URI_COMPONENT)
    )
}
