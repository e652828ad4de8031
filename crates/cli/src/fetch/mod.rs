//! Upstream services: Loqate validation, mail.tm mailboxes, SMS listings.

pub(crate) mod common;
pub mod loqate;
pub mod mailtm;
pub mod scrape;

pub(crate) use common::resolve_api_key;
pub use loqate::LoqateClient;
pub use mailtm::MailTmClient;
pub use scrape::SmsScraper;
