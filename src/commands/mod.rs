pub mod parse;
pub mod report;
pub mod user;
pub mod detect;
pub mod formats;
pub mod output;

pub use parse::run_parse;
pub use report::run_report;
pub use user::run_user;
pub use detect::run_detect;
pub use formats::run_formats;
