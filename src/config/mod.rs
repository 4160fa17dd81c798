//! Configuration module

mod site;

pub use site::SiteConfig;
pub use site::BackendConfig;
pub use site::BannerConfig;
pub use site::CommentsConfig;
pub use site::ServerConfig;
