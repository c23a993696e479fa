mod message_panel;
mod status_bar;
mod stepper;

pub use message_panel::{Message, draw_message_panel, draw_wizard_error};
pub use status_bar::{StatusBarState, StatusLine, draw_status_bar};
pub use stepper::{HorizontalStepper, StepperItem};
