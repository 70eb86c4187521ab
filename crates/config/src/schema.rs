use secrecy::{ExposeSecret, Secret};

/// Static definition of one bot identity: which environment variable holds
/// its credential and what presence text it announces once connected.
#[derive(Debug, Clone, Copy)]
pub struct IdentityDef {
    pub name: &'static str,
    pub credential_env: &'static str,
    pub activity: &'static str,
}

/// A bot identity with its credential resolved from the environment.
///
/// Immutable after construction; one live connection per identity.
#[derive(Clone)]
pub struct Identity {
    pub name: String,
    pub credential: Secret<String>,
    pub activity: String,
}

impl Identity {
    /// Resolve an [`IdentityDef`] against the process environment.
    ///
    /// The credential is empty (not an error) when the variable is unset.
    pub fn resolve(def: &IdentityDef) -> Self {
        let credential = std::env::var(def.credential_env).unwrap_or_default();
        Self {
            name: def.name.to_string(),
            credential: Secret::new(credential),
            activity: def.activity.to_string(),
        }
    }

    #[must_use]
    pub fn new(
        name: impl Into<String>,
        credential: impl Into<String>,
        activity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            credential: Secret::new(credential.into()),
            activity: activity.into(),
        }
    }

    /// Whether a non-empty credential was provided for this identity.
    pub fn has_credential(&self) -> bool {
        !self.credential.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name)
            .field("credential", &"[REDACTED]")
            .field("activity", &self.activity)
            .finish()
    }
}

/// Process-wide configuration for the fleet binary.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Address the liveness endpoint binds to.
    pub bind: String,
    /// Port the liveness endpoint listens on.
    pub port: u16,
    /// Directory the JSON stores live in. `None` means the platform default.
    pub data_dir: Option<std::path::PathBuf>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 5000,
            data_dir: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn identity_debug_redacts_credential() {
        let identity = Identity::new("Avatar Bot", "super-secret-token", "for avatar requests");
        let rendered = format!("{identity:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("super-secret-token"));
    }

    #[test]
    fn empty_credential_is_not_present() {
        let identity = Identity::new("Control Bot", "", "control panel");
        assert!(!identity.has_credential());
    }

    #[test]
    fn non_empty_credential_is_present() {
        let identity = Identity::new("Control Bot", "tok", "control panel");
        assert!(identity.has_credential());
    }
}
