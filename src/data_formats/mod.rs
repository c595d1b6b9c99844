mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

use crate::pagination::PageNumber;

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    page: Option<String>,
}

impl PageQuery {
    /// Anything that is not a positive integer means the first page.
    pub fn page_number(&self) -> PageNumber {
        PageNumber::parse_lenient(self.page.as_deref())
    }
}
