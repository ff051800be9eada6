mod csv;
mod format;
mod json;
mod table;

pub(crate) use csv::{output_report_csv, write_table_csv};
pub(crate) use format::NumberFormat;
pub(crate) use json::output_report_json;
pub(crate) use table::{TableOptions, print_report_table};
