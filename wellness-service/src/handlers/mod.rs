pub mod ai;
pub mod health;
pub mod migration;
pub mod sessions;

pub use ai::{analyze_posture, fitness_plan, therapist_chat};
pub use health::{health_check, metrics_endpoint, readiness_check, test_connection};
pub use migration::{migrate, preview_migration};
pub use sessions::{create_session, delete_session, get_session, list_sessions};
