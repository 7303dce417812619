use std::sync::Arc;

use crate::bridge::BridgeError;

/// Per-cycle behavior shared by everything the outer scheduler drives.
pub trait ModuleBehaviors {
    /// Run the module for one PE cycle.  Only the bridge can fail here; its errors are fatal.
    fn tick_one(&mut self) -> Result<(), BridgeError>;

    fn reset(&mut self);
}

pub trait Parameterizable {
    type ConfigType;

    fn conf(&self) -> &Self::ConfigType;

    fn init_conf(&mut self, conf: Arc<Self::ConfigType>);
}
