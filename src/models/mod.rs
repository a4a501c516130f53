// src/models/mod.rs

pub mod bid;
pub mod crew;
pub mod listing;
pub mod message;
pub mod moderation;
pub mod notification;
pub mod review;
pub mod specialist;
pub mod tender;
pub mod user;

use validator::ValidationError;

/// Upper bound on images/specializations per entity.
const MAX_LIST_ITEMS: usize = 20;
const MAX_ITEM_LEN: usize = 500;

/// Validates an images/specializations array: bounded size, no blank or oversized entries.
pub fn validate_string_list(items: &[String]) -> Result<(), ValidationError> {
    if items.len() > MAX_LIST_ITEMS {
        return Err(ValidationError::new("too_many_items"));
    }
    for item in items {
        if item.trim().is_empty() {
            return Err(ValidationError::new("blank_item"));
        }
        if item.len() > MAX_ITEM_LEN {
            return Err(ValidationError::new("item_too_long"));
        }
    }
    Ok(())
}

/// Bid documents: at least one non-empty entry is mandatory.
pub fn validate_documents(documents: &[String]) -> Result<(), ValidationError> {
    if documents.is_empty() {
        return Err(ValidationError::new("documents_required")
            .with_message("At least one document is required".into()));
    }
    validate_string_list(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_string_list() {
        assert!(validate_string_list(&[]).is_ok());
        assert!(validate_string_list(&["a.png".to_string()]).is_ok());
        assert!(validate_string_list(&["".to_string()]).is_err());
        assert!(validate_string_list(&vec!["x".to_string(); 21]).is_err());
        assert!(validate_string_list(&["x".repeat(501)]).is_err());
    }

    #[test]
    fn test_validate_documents_requires_one() {
        assert!(validate_documents(&[]).is_err());
        assert!(validate_documents(&["plan.pdf".to_string()]).is_ok());
    }
}
