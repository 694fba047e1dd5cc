use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
            .expect("email regex is valid")
    })
}

/// Validates an email address using regex and additional checks
pub fn is_valid_email(email: &str) -> bool {
    // Check length constraints
    if email.len() > 254 {
        return false;
    }

    if !email_regex().is_match(email) {
        return false;
    }

    // Check for consecutive dots
    if email.contains("..") {
        return false;
    }

    // Split into local and domain parts
    let Some((_, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.len() > 253 {
        return false;
    }

    // Last part (TLD) should be at least 2 characters
    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.len() < 2 {
        return false;
    }
    if domain_parts.last().map(|tld| tld.len() < 2).unwrap_or(true) {
        return false;
    }

    true
}

/// Canonical form under which usernames are stored and looked up
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}
