mod session;

pub use session::{Session, ENV_ACCESS_TOKEN};
