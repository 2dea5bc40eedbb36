mod autoplay;
mod bootstrap;
mod gameplay;
mod loop_runner;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;
