use crate::dto::HealthRes;

/// Simple health service used by the REST API and the command line client.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static health check; no instance needed.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Front desk is alive".into(),
        }
    }
}
