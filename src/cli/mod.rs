//! Terminal front end: one module per subcommand plus shared styling.

pub mod acquire;
pub mod estimate;
pub mod latest;
pub mod setup;
pub mod ui;
