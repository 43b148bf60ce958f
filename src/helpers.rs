/// Process setup shared by all binaries: panic hook, `.env`, logging, runtime.
pub mod bootstrap;
pub mod logging;
/// Turns OS signals into a cancellation token.
pub mod stop;
