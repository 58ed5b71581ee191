mod debounce;
mod fetch_loader;
mod fetch_result;
mod load_error;
mod loadable;
mod loading_state;
mod retry;
mod stream_ext;

pub use debounce::*;
pub use fetch_loader::*;
pub use fetch_result::*;
pub use load_error::*;
pub use loadable::*;
pub use loading_state::*;
pub use retry::*;
pub use stream_ext::*;

#[cfg(test)]
mod unit_tests;
