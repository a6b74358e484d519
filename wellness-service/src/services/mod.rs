pub mod assistant;
pub mod database;
pub mod fallback;
pub mod memory;
pub mod metrics;
pub mod migration;
pub mod posture;
pub mod prompts;
pub mod providers;

pub use assistant::{ProxyOutcome, WellnessAssistant};
pub use database::{MongoSessionStore, SessionPage, SessionStore};
pub use memory::InMemorySessionStore;
pub use migration::{LocalStorageKey, MigrationPlan};
