mod health_check;
mod trigger;

pub use health_check::health_check;
pub use trigger::{handle_trigger_get, handle_trigger_post, TriggerParameters, TriggerSecret};
