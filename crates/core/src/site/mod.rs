//! Site chrome around the quote form: page navigation, the mobile menu and
//! the service-area directory.

pub mod navigation;
pub mod service_area;

pub use navigation::{MobileMenu, MobileMenuView, Page, SiteNavigator};
pub use service_area::{County, CountyView, ServiceAreaDirectory, SERVICE_AREAS};
