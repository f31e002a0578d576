//! Pipeline stages.
//!
//! | Stage | Type | Rejects with |
//! |---|---|---|
//! | Request id | [`RequestIdStage`] | never |
//! | Outcome | [`OutcomeStage`] | never; counts every response |
//! | Content check | [`ContentStage`] | 415, or 500 when the schema is missing |
//! | Accept check | [`AcceptStage`] | 406 |
//! | Timing | [`TimingStage`] | never |

pub mod accept;
pub mod content;
pub mod outcome;
pub mod request_id;
pub mod timing;

pub use accept::AcceptStage;
pub use content::ContentStage;
pub use outcome::OutcomeStage;
pub use request_id::RequestIdStage;
pub use timing::TimingStage;
