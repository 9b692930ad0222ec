use std::collections::HashSet;

/// The external credential-validation collaborator (§6). Out of scope
/// for this network's core — production deployments back this with
/// whatever account/API-key store they already run — but every daemon
/// needs a seam to call into it, so it's modeled as a trait object
/// rather than hard-coded.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login_client(&self, username: &str, password: &str) -> bool;
    async fn login_producer(&self, api_key: &str) -> bool;
}

/// An in-memory `AuthService` backed by fixed credential sets, useful
/// for local runs and tests. Production deployments swap in a
/// different `Arc<dyn AuthService>` rather than editing daemon code.
pub struct StaticAuthService {
    clients: HashSet<(String, String)>,
    producer_keys: HashSet<String>,
}

impl StaticAuthService {
    pub fn new() -> Self {
        Self {
            clients: HashSet::new(),
            producer_keys: HashSet::new(),
        }
    }

    pub fn with_client(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.clients.insert((username.into(), password.into()));
        self
    }

    pub fn with_producer_key(mut self, api_key: impl Into<String>) -> Self {
        self.producer_keys.insert(api_key.into());
        self
    }
}

impl Default for StaticAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AuthService for StaticAuthService {
    async fn login_client(&self, username: &str, password: &str) -> bool {
        self.clients
            .contains(&(username.to_string(), password.to_string()))
    }

    async fn login_producer(&self, api_key: &str) -> bool {
        self.producer_keys.contains(api_key)
    }
}
