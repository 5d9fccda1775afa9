pub mod cli;
pub mod dispatch;
pub mod report;
