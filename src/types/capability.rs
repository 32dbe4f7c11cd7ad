use std::fmt;

/// The two kinds of grant a user's auth identity can hold on a Bible.
///
/// Manage grants write access (upload, edit, delete recordings). Listen grants
/// read access. Resolution treats a manage grant as sufficient for listening,
/// but the grant tables themselves do not enforce that implication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Listen,
    Manage,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::Manage, Capability::Listen];

    /// Name of the table holding grants of this capability.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Capability::Listen => "listen_auths",
            Capability::Manage => "manage_auths",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::Listen => "listen",
            Capability::Manage => "manage",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
