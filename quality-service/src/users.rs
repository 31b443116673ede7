use crate::error::{QualityError, QualityResult};
use crate::models::{User, UserRole, UserStats};
use validator::ValidateEmail;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Avatar initials: first letter of the first two words, else of the e-mail
pub fn initials(full_name: &str, email: &str) -> String {
    let from_name: String = full_name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if !from_name.is_empty() {
        return from_name;
    }
    email
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

pub fn user_stats(users: &[User]) -> UserStats {
    UserStats {
        total: users.len(),
        editors: users.iter().filter(|u| u.role == UserRole::Editor).count(),
        readers: users.iter().filter(|u| u.role == UserRole::Lector).count(),
    }
}

/// Normalized (trimmed, lowercase) address when it is a valid e-mail
pub fn validate_email(email: &str) -> QualityResult<String> {
    let email = email.trim().to_lowercase();
    if email.validate_email() {
        Ok(email)
    } else {
        Err(QualityError::validation("Email inválido"))
    }
}

pub fn validate_password(password: &str) -> QualityResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(QualityError::validation(
            "La contraseña debe tener al menos 6 caracteres",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials() {
        assert_eq!(initials("maría josé pérez", "m@x.com"), "MJ");
        assert_eq!(initials("Ana", "a@x.com"), "A");
        assert_eq!(initials("  ", "carlos@x.com"), "C");
        assert_eq!(initials("", ""), "?");
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" Ana@Empresa.com ").unwrap(), "ana@empresa.com");
        assert!(validate_email("sin-arroba").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
    }
}
