pub mod analyze;
pub mod error;
pub mod extract;
pub mod generate;
pub mod http;
pub mod provider;
pub mod session;
pub mod studio;
pub mod transcript;
pub mod types;
pub mod video;

pub use error::*;
pub use types::*;
pub use video::VideoId;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
