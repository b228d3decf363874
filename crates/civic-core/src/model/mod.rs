pub mod directory;
pub mod record;
pub mod request;
pub mod status;

pub use directory::{AgeBracket, Resident, UserAccount};
pub use record::{Fee, RequestRecord};
pub use request::{DocumentRequest, StatusChange, TransitionError};
pub use status::{Status, StatusMeta};
