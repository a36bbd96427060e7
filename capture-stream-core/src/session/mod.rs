pub mod capture;
pub(crate) mod worker;
