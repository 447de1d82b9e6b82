//! Unified Operation Model
//!
//! Every collection and global operation routes through this enum so that
//! middleware can observe them uniformly.

use super::context::{Api, OperationArgs};

/// All pipeline operations
#[derive(Debug, Clone)]
pub enum Operation {
    // Globals
    FindGlobal(OperationArgs),
    UpdateGlobal(OperationArgs),

    // Collections
    Find(OperationArgs),
    FindById(OperationArgs),
    Create(OperationArgs),
    Update(OperationArgs),
    Delete(OperationArgs),
}

impl Operation {
    /// Get operation name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindGlobal(_) => "find_global",
            Self::UpdateGlobal(_) => "update_global",
            Self::Find(_) => "find",
            Self::FindById(_) => "find_by_id",
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
        }
    }

    /// The arguments carried by the operation
    pub fn args(&self) -> &OperationArgs {
        match self {
            Self::FindGlobal(a)
            | Self::UpdateGlobal(a)
            | Self::Find(a)
            | Self::FindById(a)
            | Self::Create(a)
            | Self::Update(a)
            | Self::Delete(a) => a,
        }
    }

    /// Collection or global slug
    pub fn slug(&self) -> &str {
        &self.args().slug
    }

    /// Originating surface
    pub fn api(&self) -> Api {
        self.args().api
    }

    /// Whether this targets a global rather than a collection
    pub fn is_global(&self) -> bool {
        matches!(self, Self::FindGlobal(_) | Self::UpdateGlobal(_))
    }

    /// Whether this operation mutates the store
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::UpdateGlobal(_) | Self::Create(_) | Self::Update(_) | Self::Delete(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_accessors() {
        let op = Operation::FindGlobal(OperationArgs::new("settings").with_api(Api::Rest));
        assert_eq!(op.name(), "find_global");
        assert_eq!(op.slug(), "settings");
        assert_eq!(op.api(), Api::Rest);
        assert!(op.is_global());
        assert!(!op.is_write());
    }

    #[test]
    fn test_write_classification() {
        assert!(Operation::Create(OperationArgs::new("posts")).is_write());
        assert!(Operation::Delete(OperationArgs::new("posts")).is_write());
        assert!(!Operation::Find(OperationArgs::new("posts")).is_write());
        assert!(!Operation::FindById(OperationArgs::new("posts")).is_global());
    }
}
