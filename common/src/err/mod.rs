pub mod client_error;

use crate::err::client_error::ClientError;

pub type CResult<T> = Result<T, ClientError>;
