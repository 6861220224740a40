//! Config name validation and canonical form.
//!
//! A name is `section[.subsection].variable`. The section and the variable are
//! case-insensitive and stored lowercase; the subsection is kept verbatim and
//! may itself contain dots (`remote.my.origin.url` has subsection `my.origin`).

use super::{ConfigError, Result};

/// Validates `name` and returns its canonical form.
pub fn normalize(name: &str) -> Result<String> {
    let invalid = || ConfigError::InvalidName(name.to_string());

    let first_dot = name.find('.').ok_or_else(invalid)?;
    let last_dot = name.rfind('.').ok_or_else(invalid)?;

    let section = &name[..first_dot];
    let variable = &name[last_dot + 1..];

    if section.is_empty() || !section.chars().all(is_section_char) {
        return Err(invalid());
    }
    if !is_valid_variable(variable) {
        return Err(invalid());
    }

    let mut canonical = section.to_ascii_lowercase();
    if first_dot != last_dot {
        let subsection = &name[first_dot + 1..last_dot];
        if subsection.contains(['\n', '\0']) {
            return Err(invalid());
        }
        canonical.push('.');
        canonical.push_str(subsection);
    }
    canonical.push('.');
    canonical.push_str(&variable.to_ascii_lowercase());
    Ok(canonical)
}

/// Splits a canonical name into its header (`section[.subsection]`) and
/// variable parts.
pub fn split(canonical: &str) -> (&str, &str) {
    match canonical.rfind('.') {
        Some(idx) => (&canonical[..idx], &canonical[idx + 1..]),
        None => ("", canonical),
    }
}

fn is_section_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_valid_variable(variable: &str) -> bool {
    let mut chars = variable.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric() || c == '-'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_and_variable_are_lowercased() {
        assert_eq!(normalize("Core.Bare").unwrap(), "core.bare");
    }

    #[test]
    fn test_subsection_case_is_preserved() {
        assert_eq!(
            normalize("Remote.Origin.URL").unwrap(),
            "remote.Origin.url"
        );
        assert_eq!(
            normalize("remote.my.origin.url").unwrap(),
            "remote.my.origin.url"
        );
    }

    #[test]
    fn test_rejects_malformed_names() {
        for name in ["", "core", ".bare", "core.", "core.1bare", "co re.bare", "core.ba_re"] {
            assert!(
                matches!(normalize(name), Err(ConfigError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_split_uses_last_dot() {
        assert_eq!(split("remote.my.origin.url"), ("remote.my.origin", "url"));
        assert_eq!(split("core.bare"), ("core", "bare"));
    }
}
