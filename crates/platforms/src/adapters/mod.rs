mod discord;
mod github;
mod gitlab;
mod instagram;
mod plex;
mod reddit;
mod steam;
mod threads;
mod twitch;
mod twitterx;

pub use discord::Discord;
pub use github::GitHub;
pub use gitlab::{DEFAULT_ENDPOINT as GITLAB_API_ENDPOINT, GitLab};
pub use instagram::Instagram;
pub use plex::Plex;
pub use reddit::Reddit;
pub use steam::{APPROVAL_TIMEOUT as STEAM_APPROVAL_TIMEOUT, Steam};
pub use threads::Threads;
pub use twitch::Twitch;
pub use twitterx::TwitterX;
