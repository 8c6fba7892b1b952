// Domain-layer modules and shared errors/models
pub mod lead_signals {
    pub use crate::lead_signals::*;
}

pub mod follow_up {
    pub use crate::follow_up::*;
}

pub mod chat {
    pub use crate::chat::*;
}

pub mod stats {
    pub use crate::stats::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
