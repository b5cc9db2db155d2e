pub mod cancel;
#[cfg(feature = "default-http-client")]
pub mod client;
