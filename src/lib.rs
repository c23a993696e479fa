pub mod app;
pub mod error;
pub mod event;
pub mod onboard;
pub mod ui;
pub mod vim;
pub mod wizard;
