pub mod session;

pub use session::{LoadReport, Session};
