pub mod amounts;
pub mod invoice;
pub mod order;
pub mod subscription;

use fisco_core::lookup::InMemoryChart;

use crate::input;

/// Load the chart of accounts from `--chart <file>`, falling back to the
/// Italian-convention starter chart.
pub(crate) fn load_chart(
    path: &Option<String>,
) -> Result<InMemoryChart, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::read_document(&Some(path.clone()), "chart of accounts"),
        None => Ok(InMemoryChart::italian_defaults()),
    }
}
