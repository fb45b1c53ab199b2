//! Wire formats of the supported chat platforms.

mod discord;
mod groupme;
mod slack;

pub use discord::Discord;
pub use groupme::GroupMe;
pub use slack::Slack;
