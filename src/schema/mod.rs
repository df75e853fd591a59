//! Plain data shared by the resolver: attributes, records, history, rolls
//! and the settings-record text format.

pub mod attribute;
pub mod history;
pub mod record;
pub mod roll;
pub mod sections;
pub mod settings;
