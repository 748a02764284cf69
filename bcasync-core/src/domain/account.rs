//! Ledger-side account and category models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account in the budgeting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAccount {
    pub id: Uuid,
    pub name: String,
    /// Working balance in milliunits
    pub balance: i64,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// A budgeting-service category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Categories are only listed grouped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Find a category by exact name across all groups
pub fn find_category<'a>(groups: &'a [CategoryGroup], name: &str) -> Option<&'a Category> {
    groups
        .iter()
        .flat_map(|g| g.categories.iter())
        .find(|c| !c.deleted && c.name == name)
}

/// An account in the double-entry ledger service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAccount {
    pub id: String,
    pub name: String,
    /// Ledger account type, e.g. "asset" or "reconciliation"
    pub account_type: String,
    pub current_balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, deleted: bool) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            hidden: false,
            deleted,
        }
    }

    #[test]
    fn test_find_category_across_groups() {
        let groups = vec![
            CategoryGroup {
                id: Uuid::new_v4(),
                name: "Bills".to_string(),
                categories: vec![category("Rent", false)],
            },
            CategoryGroup {
                id: Uuid::new_v4(),
                name: "Internal Master Category".to_string(),
                categories: vec![category("Inflows", false)],
            },
        ];

        assert_eq!(find_category(&groups, "Inflows").unwrap().name, "Inflows");
        assert!(find_category(&groups, "inflows").is_none());
    }

    #[test]
    fn test_find_category_skips_deleted() {
        let groups = vec![CategoryGroup {
            id: Uuid::new_v4(),
            name: "Old".to_string(),
            categories: vec![category("Inflows", true)],
        }];
        assert!(find_category(&groups, "Inflows").is_none());
    }
}
