pub mod calibration;
pub mod codec;
pub mod kinematics;
pub mod tracing;
pub mod transport;

pub use calibration::*;
pub use codec::*;
pub use kinematics::*;
pub use self::tracing::*;
pub use transport::*;
