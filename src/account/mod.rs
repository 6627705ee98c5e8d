//! Bank and cash accounts that transactions are settled against.

mod core;

pub use core::{
    Account, NewAccount, count_accounts, create_account, create_account_table, get_all_accounts,
    get_total_balance,
};
