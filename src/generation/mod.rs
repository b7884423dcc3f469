pub(crate) mod generator;
pub(crate) mod http;
pub(crate) mod prompt;
pub(crate) mod scheduler;
pub(crate) mod state;
