//! Free-text tags for labelling transactions.

mod db;
mod domain;

pub use db::{create_tag_table, get_all_tags, get_or_create_tag, get_tag};
pub use domain::{Tag, TagId, TagName};
