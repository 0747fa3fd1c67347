pub mod device_port;
pub mod local_data_port;
pub mod renderer_port;

pub use device_port::{AlertRequest, ConfirmChoice, ConfirmRequest, DeviceError, DevicePort};
pub use local_data_port::LocalDataStore;
pub use renderer_port::{RendererChannel, RendererError};
