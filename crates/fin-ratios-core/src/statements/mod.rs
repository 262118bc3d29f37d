pub mod metrics;
pub mod record;
