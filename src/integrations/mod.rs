//! External service integrations.

pub mod llm_client {
    pub use crate::llm_client::*;
}

pub mod notifier {
    pub use crate::notifier::*;
}
