use crate::error::ValidationError;

/// Declarative password rules applied at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_digit: bool,
    pub require_symbol: bool,
    /// Non-alphanumeric characters accepted in a password
    pub allowed_symbols: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 16,
            require_digit: true,
            require_symbol: true,
            allowed_symbols: "!@#$%^&*".to_string(),
        }
    }
}

impl PasswordPolicy {
    fn is_symbol(&self, c: char) -> bool {
        self.allowed_symbols.contains(c)
    }

    /// Checks a password against every rule, reporting the first one broken
    pub fn check(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }

        let length = password.chars().count();
        if length < self.min_length {
            return Err(ValidationError::PasswordTooShort);
        }
        if length > self.max_length {
            return Err(ValidationError::PasswordTooLong);
        }

        if password
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && !self.is_symbol(c))
        {
            return Err(ValidationError::PasswordInvalidCharacter);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PasswordMissingDigit);
        }
        if self.require_symbol && !password.chars().any(|c| self.is_symbol(c)) {
            return Err(ValidationError::PasswordMissingSymbol);
        }

        Ok(())
    }

    /// Shape check for login: present and within the length bound.
    ///
    /// Login does not re-apply the character rules so a policy change never
    /// locks out accounts registered under an older one.
    pub fn check_presented(&self, password: &str) -> Result<(), ValidationError> {
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if password.chars().count() > self.max_length {
            return Err(ValidationError::PasswordTooLong);
        }
        Ok(())
    }
}
