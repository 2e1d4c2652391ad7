//! Static catalogs of transaction and note categories.
//!
//! DESIGN
//! ======
//! Categories are compiled in rather than stored: transactions reference a
//! category by its string id, and ids are stable across exports so an
//! exported file can be re-imported into any instance. Both kinds carry an
//! "Other" entry with distinct ids (`9` and `15`).

use serde::{Deserialize, Serialize};

// =============================================================================
// TRANSACTION KIND
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

// =============================================================================
// TRANSACTION CATEGORIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

const fn expense(id: &'static str, name: &'static str, icon: &'static str, color: &'static str) -> Category {
    Category { id, name, icon, color, kind: TransactionKind::Expense }
}

const fn income(id: &'static str, name: &'static str, icon: &'static str, color: &'static str) -> Category {
    Category { id, name, icon, color, kind: TransactionKind::Income }
}

pub const EXPENSE_CATEGORIES: [Category; 9] = [
    expense("1", "Food & Dining", "🍕", "#FF6B6B"),
    expense("2", "Transportation", "🚗", "#4ECDC4"),
    expense("3", "Shopping", "🛍️", "#45B7D1"),
    expense("4", "Entertainment", "🎬", "#96CEB4"),
    expense("5", "Bills & Utilities", "⚡", "#FFEAA7"),
    expense("6", "Healthcare", "🏥", "#DDA0DD"),
    expense("7", "Education", "📚", "#F39C12"),
    expense("8", "Travel", "✈️", "#E74C3C"),
    expense("9", "Other", "💰", "#BDC3C7"),
];

pub const INCOME_CATEGORIES: [Category; 6] = [
    income("10", "Salary", "💼", "#2ECC71"),
    income("11", "Freelance", "💻", "#3498DB"),
    income("12", "Investment", "📈", "#9B59B6"),
    income("13", "Business", "🏢", "#E67E22"),
    income("14", "Gift", "🎁", "#E91E63"),
    income("15", "Other", "💰", "#27AE60"),
];

/// Color used for transactions whose category id is not in the catalog.
pub const UNKNOWN_CATEGORY_COLOR: &str = "#BDC3C7";

/// Categories for one kind, in display order.
#[must_use]
pub fn categories_for(kind: TransactionKind) -> &'static [Category] {
    match kind {
        TransactionKind::Income => &INCOME_CATEGORIES,
        TransactionKind::Expense => &EXPENSE_CATEGORIES,
    }
}

/// Every category, expenses first.
pub fn all_categories() -> impl Iterator<Item = &'static Category> {
    EXPENSE_CATEGORIES.iter().chain(INCOME_CATEGORIES.iter())
}

#[must_use]
pub fn find_category(id: &str) -> Option<&'static Category> {
    all_categories().find(|c| c.id == id)
}

/// True when `id` names a category belonging to `kind`.
#[must_use]
pub fn category_matches_kind(id: &str, kind: TransactionKind) -> bool {
    categories_for(kind).iter().any(|c| c.id == id)
}

// =============================================================================
// NOTE CATEGORIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteCategory {
    FinancialGoal,
    BudgetPlan,
    InvestmentIdea,
    ExpenseReminder,
    #[default]
    General,
}

impl NoteCategory {
    pub const ALL: [Self; 5] =
        [Self::FinancialGoal, Self::BudgetPlan, Self::InvestmentIdea, Self::ExpenseReminder, Self::General];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FinancialGoal => "financial-goal",
            Self::BudgetPlan => "budget-plan",
            Self::InvestmentIdea => "investment-idea",
            Self::ExpenseReminder => "expense-reminder",
            Self::General => "general",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw.trim())
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::FinancialGoal => "Financial Goal",
            Self::BudgetPlan => "Budget Plan",
            Self::InvestmentIdea => "Investment Idea",
            Self::ExpenseReminder => "Expense Reminder",
            Self::General => "General",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::FinancialGoal => "#3B82F6",
            Self::BudgetPlan => "#10B981",
            Self::InvestmentIdea => "#F59E0B",
            Self::ExpenseReminder => "#EF4444",
            Self::General => "#8B5CF6",
        }
    }
}

/// Serializable view of a note category for `GET /api/notes/categories`.
#[derive(Debug, Clone, Serialize)]
pub struct NoteCategoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
}

#[must_use]
pub fn note_categories() -> Vec<NoteCategoryInfo> {
    NoteCategory::ALL
        .into_iter()
        .map(|c| NoteCategoryInfo { id: c.as_str(), name: c.display_name(), color: c.color() })
        .collect()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
