pub mod role;
pub mod notice;
pub mod approval;
pub mod profile;
pub mod department;
pub mod engagement;
pub mod notification;
pub mod audit;

pub use role::*;
pub use notice::*;
pub use approval::*;
pub use profile::*;
pub use department::*;
pub use engagement::*;
pub use notification::*;
pub use audit::*;

/// Answer to the "are you sure?" step that guards destructive admin actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl Confirmation {
    pub fn from_flag(confirmed: Option<bool>) -> Self {
        if confirmed.unwrap_or(false) {
            Confirmation::Confirmed
        } else {
            Confirmation::Cancelled
        }
    }
}
