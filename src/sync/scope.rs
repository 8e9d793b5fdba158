//! The filter that decides which subset of items a list loads.

use crate::error::OperationError;
use chrono::NaiveDate;
use std::fmt;

/// A user, a category, or a user's articles on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    User(String),
    Category(String),
    Date { user_id: String, date: NaiveDate },
}

fn non_empty(key: &str, what: &str) -> Result<String, OperationError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(OperationError::precondition(format!("{what} is required")));
    }
    Ok(trimmed.to_owned())
}

impl Scope {
    pub fn user(user_id: &str) -> Result<Self, OperationError> {
        Ok(Scope::User(non_empty(user_id, "User id")?))
    }

    pub fn category(category_id: &str) -> Result<Self, OperationError> {
        Ok(Scope::Category(non_empty(category_id, "Category id")?))
    }

    pub fn date(user_id: &str, date: NaiveDate) -> Result<Self, OperationError> {
        Ok(Scope::Date {
            user_id: non_empty(user_id, "User id")?,
            date,
        })
    }

    /// Re-checks the key, for scopes built directly from the enum variants.
    pub(crate) fn validate(&self) -> Result<(), OperationError> {
        let key = match self {
            Scope::User(id) | Scope::Category(id) => id,
            Scope::Date { user_id, .. } => user_id,
        };
        if key.trim().is_empty() {
            return Err(OperationError::precondition("Scope key must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User(id) => write!(f, "user:{id}"),
            Scope::Category(id) => write!(f, "category:{id}"),
            Scope::Date { user_id, date } => write!(f, "date:{user_id}@{}", date.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_blank_keys_rejected() {
        assert_eq!(Scope::user("").unwrap_err().kind(), ErrorKind::Precondition);
        assert_eq!(
            Scope::category("   ").unwrap_err().kind(),
            ErrorKind::Precondition
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert!(Scope::date("", date).is_err());
    }

    #[test]
    fn test_keys_trimmed() {
        assert_eq!(Scope::user(" 42 ").unwrap(), Scope::User("42".into()));
    }

    #[test]
    fn test_validate_catches_direct_construction() {
        assert!(Scope::Category(String::new()).validate().is_err());
        assert!(Scope::Category("7".into()).validate().is_ok());
    }

    #[test]
    fn test_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(Scope::date("9", date).unwrap().to_string(), "date:9@2024-03-05");
        assert_eq!(Scope::category("3").unwrap().to_string(), "category:3");
    }
}
