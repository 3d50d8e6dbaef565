pub mod ajax;
pub mod bootstrap;
pub mod id;

pub use ajax::{AjaxAction, AjaxEnvelope};
pub use bootstrap::{TimerBootstrap, TimerOptions};
pub use id::PrefixedId;
