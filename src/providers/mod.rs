pub mod remote;
pub mod util;

pub use remote::RemoteConfigProvider;
