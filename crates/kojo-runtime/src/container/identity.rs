//! Instance identity.

use uuid::Uuid;

/// Length of the random suffix appended to the instance name.
const ID_SUFFIX_LEN: usize = 5;

/// Name, unique id and display icon of one Kojo instance.
///
/// Assigned once at construction and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    name: String,
    id: String,
    icon: String,
}

impl InstanceIdentity {
    /// Create an identity whose id is `<name>.<random suffix>`, e.g. `users.3f9a1`.
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        let name = name.into();
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!("{}.{}", name, &suffix[..ID_SUFFIX_LEN]);

        Self {
            name,
            id,
            icon: icon.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Identity shown in log lines: the full id when the suffix is enabled,
    /// otherwise just the name.
    #[must_use]
    pub fn logger_identity(&self, suffix_enabled: bool) -> &str {
        if suffix_enabled {
            &self.id
        } else {
            &self.name
        }
    }
}
