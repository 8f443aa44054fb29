//! Administrator-defined business-hour windows.

pub mod window;

pub use window::ScheduleWindow;
