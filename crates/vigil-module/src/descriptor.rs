//! Module identity and capability requirements.
//!
//! Every module variant carries a static [`ModuleDescriptor`]: the
//! stable engine name used for lookup and configuration binding, a
//! category tag, and the capabilities the supervisor must wire into the
//! initialization payload. This is an explicit registration-time table
//! rather than runtime type inspection: the catalog pairs each engine
//! name with a factory and its descriptor, and requirements are checked
//! when the module is registered.

use serde::{Deserialize, Serialize};

/// Category tag for a module variant, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Reacts to observed changes (e.g. filesystem probes).
    Event,

    /// Runs scheduled work cycles.
    Batch,
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Batch => write!(f, "batch"),
        }
    }
}

/// Shared services a module requires at initialization.
///
/// Declared statically in the descriptor and validated at registration
/// time against the host configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// The module sends notifications; the supervisor must provide
    /// sender and receiver addresses in the initialization payload.
    Notify,
}

/// Static identity of a module variant.
///
/// # Example
///
/// ```
/// use vigil_module::{Capability, ModuleDescriptor, ModuleKind};
///
/// const DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
///     engine: "file_watch",
///     kind: ModuleKind::Event,
///     requires: &[Capability::Notify],
/// };
///
/// assert!(DESCRIPTOR.matches("FILE_WATCH"));
/// assert!(DESCRIPTOR.requires_notify());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Stable unique engine name, lowercase by convention.
    pub engine: &'static str,

    /// Category tag.
    pub kind: ModuleKind,

    /// Capability requirements checked at registration.
    pub requires: &'static [Capability],
}

impl ModuleDescriptor {
    /// Case-insensitive engine name match.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.engine.eq_ignore_ascii_case(name)
    }

    /// Returns `true` if the module declares the notify requirement.
    #[must_use]
    pub fn requires_notify(&self) -> bool {
        self.requires.contains(&Capability::Notify)
    }
}

impl std::fmt::Display for ModuleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.engine, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: ModuleDescriptor = ModuleDescriptor {
        engine: "heartbeat",
        kind: ModuleKind::Batch,
        requires: &[],
    };

    const NOTIFYING: ModuleDescriptor = ModuleDescriptor {
        engine: "file_watch",
        kind: ModuleKind::Event,
        requires: &[Capability::Notify],
    };

    #[test]
    fn matches_case_insensitive() {
        assert!(PLAIN.matches("heartbeat"));
        assert!(PLAIN.matches("HeartBeat"));
        assert!(!PLAIN.matches("file_watch"));
    }

    #[test]
    fn notify_requirement() {
        assert!(!PLAIN.requires_notify());
        assert!(NOTIFYING.requires_notify());
    }

    #[test]
    fn display_format() {
        assert_eq!(PLAIN.to_string(), "heartbeat (batch)");
        assert_eq!(NOTIFYING.to_string(), "file_watch (event)");
    }
}
