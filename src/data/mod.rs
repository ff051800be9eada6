//! Data layer - loading, schema normalization and selection filters

mod filter;
mod loader;
mod schema;

pub(crate) use filter::{AvailableFilters, Selection, month_abbreviation, parse_months, parse_year_arg};
pub(crate) use loader::load_table;
