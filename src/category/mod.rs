//! Spending/income categories that transactions are recorded against.

mod core;

pub use core::{
    Category, CategorySummary, category_summary, count_categories, create_category,
    create_category_table, get_all_categories, get_categories_by_type,
};
