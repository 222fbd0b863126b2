mod file_share;

pub use file_share::{FileShare, IncomingShareRow, OutgoingShareRow, RecipientRow};
