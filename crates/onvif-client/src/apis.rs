//! Request constructors, grouped by service.
pub mod device {
    pub use crate::services::device::{get_capabilities, get_system_date_and_time};
}

pub mod media {
    pub use crate::services::media::get_profiles;
}

pub use crate::services::get_service_capabilities;
