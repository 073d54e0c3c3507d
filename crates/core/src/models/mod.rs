pub mod alert;
pub mod chart;
pub mod coin;
pub mod portfolio;
pub mod settings;
pub mod table;
