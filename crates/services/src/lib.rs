#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod progression_service;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use error::{AppServicesError, CatalogServiceError, ProgressionServiceError};
pub use progression_service::{
    CourseOverview, ModuleOverview, ProgressionService, QuizSubmission,
};
