//! Output formatting for topologies and created resources.
//!
//! This module handles what the operator sees after a run:
//! - [`report`] - resource graph rows, topology summary, JSON report file
//! - [`terminal`] - aligned terminal rows and the progress bar

mod report;
mod terminal;

pub use report::{graph_rows, print_graph, print_topology, report_file_name, save_report};
pub use terminal::{column_widths, format_field, format_row, progress_line};
