pub mod slide_service_client;

pub use slide_service_client::SlideServiceClient;
