//! Shell string helpers for commands that must run through `sh -c`

/// Quote a word for a POSIX shell, leaving plain words untouched
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ','))
    {
        return s.to_string();
    }

    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Join a program and its arguments into one quoted command line
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| shell_quote(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Chain several command lines so each runs only if the previous succeeded
pub fn and_chain<S: AsRef<str>>(commands: &[S]) -> String {
    commands
        .iter()
        .map(|c| c.as_ref())
        .collect::<Vec<_>>()
        .join(" && ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("prefer-dark"), "prefer-dark");
        assert_eq!(shell_quote("United States"), "'United States'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn test_join_and_chain() {
        let first = join_words(&["gsettings", "set", "a.b", "name", "Orchis Light"]);
        assert_eq!(first, "gsettings set a.b name 'Orchis Light'");
        assert_eq!(and_chain(&["true", "false"]), "true && false");
    }
}
