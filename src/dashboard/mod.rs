pub mod controller;
pub mod page;
pub mod subscription;

pub use controller::DashboardController;
pub use page::{ContainerContent, PageRegistry};
pub use subscription::{Subscription, Subscriptions};
