pub mod chart;
pub(crate) mod colours;
pub(crate) mod drawing;
