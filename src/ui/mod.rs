pub mod icons;
pub mod progress;
pub mod status;

pub use progress::RunProgress;
pub use status::{render_badges, render_plan, render_status};
