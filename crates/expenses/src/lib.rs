//! Expenses domain module.

pub mod expense;

pub use expense::{Expense, ExpenseCategory, ExpenseFilter, ExpensePatch, ExpenseType, NewExpense};
