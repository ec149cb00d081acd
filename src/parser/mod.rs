pub mod table;

pub use table::{extract_tables, HtmlTable};
