pub mod generator;
pub mod records;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod tester;

pub use records::check_record_file;
pub use scenarios::{catalog, find_scenario, list_scenarios};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
